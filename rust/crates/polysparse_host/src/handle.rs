//! Reference-counted handles owned by the host
//!
//! The table owns every value a host can see. A handle is an opaque id plus
//! the referent's type tag; the slot keeps the value behind an `Arc` so an
//! operation that already resolved its operands keeps them alive even if
//! the host releases the handle mid-flight.

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::config::SessionConfig;
use crate::error::{HostError, Result};
use crate::tag::TypeTag;
use crate::value::HostType;

pub type HandleId = u64;

/// Opaque reference to a value in a [`HandleTable`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HostHandle {
    id: HandleId,
    tag: TypeTag,
}

impl HostHandle {
    pub fn id(&self) -> HandleId {
        self.id
    }

    pub fn tag(&self) -> TypeTag {
        self.tag
    }
}

struct Slot {
    tag: TypeTag,
    value: Arc<dyn Any + Send + Sync>,
    refs: usize,
}

pub struct HandleTable {
    slots: RwLock<FxHashMap<HandleId, Slot>>,
    // ids are never reused, so a stale handle cannot alias a newer value
    next_id: AtomicU64,
    limit: Option<usize>,
}

impl Default for HandleTable {
    fn default() -> Self {
        Self::new(&SessionConfig::default())
    }
}

impl HandleTable {
    pub fn new(config: &SessionConfig) -> Self {
        let mut slots = FxHashMap::default();
        slots.reserve(config.initial_capacity);
        Self {
            slots: RwLock::new(slots),
            next_id: AtomicU64::new(1),
            limit: config.handle_limit,
        }
    }

    /// Move a value into the table; the new handle has one reference
    pub fn acquire<T: HostType>(&self, value: T) -> Result<HostHandle> {
        let mut slots = self.slots.write();
        if let Some(limit) = self.limit {
            if slots.len() >= limit {
                tracing::warn!(limit, "handle table full");
                return Err(HostError::HandleLimit(limit));
            }
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        slots.insert(
            id,
            Slot {
                tag: T::TAG,
                value: Arc::new(value),
                refs: 1,
            },
        );
        tracing::trace!(handle = id, tag = %T::TAG, "acquired");
        Ok(HostHandle { id, tag: T::TAG })
    }

    /// Add a reference; returns the new count
    pub fn retain(&self, handle: HostHandle) -> Result<usize> {
        let mut slots = self.slots.write();
        let slot = slots.get_mut(&handle.id).ok_or(HostError::StaleHandle(handle.id))?;
        slot.refs += 1;
        tracing::trace!(handle = handle.id, refs = slot.refs, "retained");
        Ok(slot.refs)
    }

    /// Drop a reference; returns `true` when the referent was destroyed
    pub fn release(&self, handle: HostHandle) -> Result<bool> {
        let removed = {
            let mut slots = self.slots.write();
            let slot = slots.get_mut(&handle.id).ok_or(HostError::StaleHandle(handle.id))?;
            slot.refs -= 1;
            tracing::trace!(handle = handle.id, refs = slot.refs, "released");
            if slot.refs == 0 {
                slots.remove(&handle.id)
            } else {
                None
            }
        };
        // large matrices are freed outside the lock
        Ok(removed.is_some())
    }

    /// Shared reference to the referent, checked against `T`
    pub fn resolve<T: HostType>(&self, handle: HostHandle) -> Result<Arc<T>> {
        let (tag, value) = {
            let slots = self.slots.read();
            let slot = slots.get(&handle.id).ok_or(HostError::StaleHandle(handle.id))?;
            (slot.tag, Arc::clone(&slot.value))
        };
        if tag != T::TAG {
            return Err(HostError::mismatch(T::TAG, tag));
        }
        value.downcast::<T>().map_err(|_| HostError::mismatch(T::TAG, tag))
    }

    /// Tag recorded for a live handle
    pub fn tag_of(&self, handle: HostHandle) -> Result<TypeTag> {
        self.slots
            .read()
            .get(&handle.id)
            .map(|slot| slot.tag)
            .ok_or(HostError::StaleHandle(handle.id))
    }

    pub fn ref_count(&self, handle: HostHandle) -> Option<usize> {
        self.slots.read().get(&handle.id).map(|slot| slot.refs)
    }

    /// Number of live handles
    pub fn live(&self) -> usize {
        self.slots.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polysparse_core::Rational;

    #[test]
    fn test_acquire_resolve_release() {
        let table = HandleTable::default();
        let h = table.acquire(Rational::from_int(5)).unwrap();
        assert_eq!(h.tag(), TypeTag::Rational);
        assert_eq!(*table.resolve::<Rational>(h).unwrap(), Rational::from_int(5));
        assert_eq!(table.release(h), Ok(true));
        assert_eq!(table.resolve::<Rational>(h), Err(HostError::StaleHandle(h.id())));
        assert_eq!(table.release(h), Err(HostError::StaleHandle(h.id())));
    }

    #[test]
    fn test_refcount_keeps_value_alive() {
        let table = HandleTable::default();
        let h = table.acquire(7i64).unwrap();
        assert_eq!(table.retain(h), Ok(2));
        assert_eq!(table.release(h), Ok(false));
        assert_eq!(table.ref_count(h), Some(1));
        assert_eq!(*table.resolve::<i64>(h).unwrap(), 7);
        assert_eq!(table.release(h), Ok(true));
        assert_eq!(table.live(), 0);
    }

    #[test]
    fn test_resolved_value_outlives_release() {
        let table = HandleTable::default();
        let h = table.acquire(Rational::from_int(3)).unwrap();
        let held = table.resolve::<Rational>(h).unwrap();
        table.release(h).unwrap();
        assert_eq!(*held, Rational::from_int(3));
    }

    #[test]
    fn test_wrong_type_is_mismatch() {
        let table = HandleTable::default();
        let h = table.acquire(1i64).unwrap();
        assert_eq!(
            table.resolve::<Rational>(h).unwrap_err(),
            HostError::mismatch(TypeTag::Rational, TypeTag::Int)
        );
    }

    #[test]
    fn test_ids_are_not_reused() {
        let table = HandleTable::default();
        let a = table.acquire(true).unwrap();
        table.release(a).unwrap();
        let b = table.acquire(true).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_limit() {
        let table = HandleTable::new(&SessionConfig {
            handle_limit: Some(1),
            ..SessionConfig::default()
        });
        let a = table.acquire(1i64).unwrap();
        assert_eq!(table.acquire(2i64), Err(HostError::HandleLimit(1)));
        table.release(a).unwrap();
        assert!(table.acquire(3i64).is_ok());
    }
}
