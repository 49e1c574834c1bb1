//! Operator registry
//!
//! Maps `(operator, operand type tags)` to the concrete routine generated
//! for that signature. Routines arrive in instantiation units; each unit
//! contributes a `register` function and the registry is assembled once,
//! on first use, from all of them.

use std::collections::hash_map::Entry;
use std::sync::OnceLock;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::construct::Triple;
use crate::error::{HostError, Result};
use crate::handle::{HandleTable, HostHandle};
use crate::manifest::{Declaration, Manifest, OperatorKind};
use crate::tag::TypeTag;

pub type Routine = fn(&HandleTable, &[HostHandle]) -> Result<HostHandle>;
pub type Constructor = fn(&HandleTable, i64, i64, &[Triple]) -> Result<HostHandle>;
pub type Signature = SmallVec<[TypeTag; 3]>;

/// One instantiation unit
#[derive(Clone, Copy)]
pub struct Unit {
    pub name: &'static str,
    pub register: fn(&mut RegistryBuilder),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitSummary {
    pub name: &'static str,
    pub routines: usize,
}

#[derive(Clone, Copy)]
struct Binding<F> {
    routine: F,
    unit: &'static str,
}

#[derive(Default)]
pub struct RegistryBuilder {
    current: &'static str,
    operators: FxHashMap<(OperatorKind, Signature), Binding<Routine>>,
    constructors: FxHashMap<TypeTag, Binding<Constructor>>,
    units: Vec<UnitSummary>,
}

impl RegistryBuilder {
    fn begin(&mut self, unit: &'static str) {
        self.current = unit;
        self.units.push(UnitSummary { name: unit, routines: 0 });
    }

    fn count(&mut self) {
        if let Some(summary) = self.units.last_mut() {
            summary.routines += 1;
        }
    }

    /// Register the routine for `kind(signature...)`. The first registration wins.
    pub fn operator(&mut self, kind: OperatorKind, signature: &[TypeTag], routine: Routine) {
        let unit = self.current;
        match self.operators.entry((kind, Signature::from_slice(signature))) {
            Entry::Occupied(existing) => {
                tracing::warn!(
                    op = %kind,
                    unit,
                    kept = existing.get().unit,
                    "duplicate routine ignored"
                );
            }
            Entry::Vacant(slot) => {
                slot.insert(Binding { routine, unit });
                self.count();
            }
        }
    }

    pub fn constructor(&mut self, target: TypeTag, routine: Constructor) {
        let unit = self.current;
        match self.constructors.entry(target) {
            Entry::Occupied(existing) => {
                tracing::warn!(
                    tag = %target,
                    unit,
                    kept = existing.get().unit,
                    "duplicate constructor ignored"
                );
            }
            Entry::Vacant(slot) => {
                slot.insert(Binding { routine, unit });
                self.count();
            }
        }
    }

    fn finish(self) -> OperatorRegistry {
        OperatorRegistry {
            operators: self.operators,
            constructors: self.constructors,
            units: self.units,
        }
    }
}

pub struct OperatorRegistry {
    operators: FxHashMap<(OperatorKind, Signature), Binding<Routine>>,
    constructors: FxHashMap<TypeTag, Binding<Constructor>>,
    units: Vec<UnitSummary>,
}

fn render_signature(signature: &[TypeTag]) -> String {
    signature.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

impl OperatorRegistry {
    pub fn from_units(units: &[Unit]) -> Self {
        let mut builder = RegistryBuilder::default();
        for unit in units {
            builder.begin(unit.name);
            (unit.register)(&mut builder);
            let routines = builder.units.last().map_or(0, |u| u.routines);
            tracing::debug!(unit = unit.name, routines, "unit registered");
        }
        builder.finish()
    }

    /// Registry built from the generated instantiation units
    pub fn global() -> &'static Self {
        static REGISTRY: OnceLock<OperatorRegistry> = OnceLock::new();
        REGISTRY.get_or_init(|| {
            let registry = Self::from_units(crate::instances::UNITS);
            tracing::info!(
                units = registry.units.len(),
                routines = registry.len(),
                "operator registry populated"
            );
            registry
        })
    }

    pub fn lookup(&self, kind: OperatorKind, signature: &[TypeTag]) -> Result<Routine> {
        self.operators
            .get(&(kind, Signature::from_slice(signature)))
            .map(|binding| binding.routine)
            .ok_or_else(|| HostError::UnknownOperator {
                op: kind.to_string(),
                signature: render_signature(signature),
            })
    }

    /// Run `kind` on `args`, selecting the routine by the handles' tags
    pub fn dispatch(
        &self,
        table: &HandleTable,
        kind: OperatorKind,
        args: &[HostHandle],
    ) -> Result<HostHandle> {
        if args.len() != kind.arity() {
            return Err(HostError::Arity {
                op: kind,
                expected: kind.arity(),
                found: args.len(),
            });
        }
        let signature: Signature = args.iter().map(HostHandle::tag).collect();
        let binding = self.operators.get(&(kind, signature.clone())).ok_or_else(|| {
            tracing::debug!(op = %kind, signature = %render_signature(&signature), "no routine");
            HostError::UnknownOperator {
                op: kind.to_string(),
                signature: render_signature(&signature),
            }
        })?;
        tracing::debug!(
            op = %kind,
            signature = %render_signature(&signature),
            unit = binding.unit,
            "dispatch"
        );
        let result = (binding.routine)(table, args);
        if let Err(e) = &result {
            tracing::debug!(op = %kind, error_kind = ?e.kind(), error = %e, "dispatch failed");
        }
        result
    }

    pub fn construct(
        &self,
        table: &HandleTable,
        target: TypeTag,
        rows: i64,
        cols: i64,
        triples: &[Triple],
    ) -> Result<HostHandle> {
        let binding = self.constructors.get(&target).ok_or_else(|| HostError::UnknownOperator {
            op: "new".to_string(),
            signature: target.to_string(),
        })?;
        (binding.routine)(table, rows, cols, triples)
    }

    pub fn contains(&self, declaration: &Declaration) -> bool {
        match declaration {
            Declaration::Operator { kind, operands } => self
                .operators
                .contains_key(&(*kind, Signature::from_slice(operands))),
            Declaration::Constructor { target } => self.constructors.contains_key(target),
        }
    }

    /// Declarations of `manifest` that have no registered routine
    pub fn missing(&self, manifest: &Manifest) -> Vec<Declaration> {
        manifest
            .unique_declarations()
            .into_iter()
            .filter(|d| !self.contains(d))
            .collect()
    }

    /// Every registered declaration with its unit, sorted
    pub fn declarations(&self) -> Vec<(Declaration, &'static str)> {
        let mut out: Vec<(Declaration, &'static str)> = self
            .operators
            .iter()
            .map(|((kind, signature), binding)| {
                (
                    Declaration::Operator {
                        kind: *kind,
                        operands: signature.to_vec(),
                    },
                    binding.unit,
                )
            })
            .chain(self.constructors.iter().map(|(target, binding)| {
                (Declaration::Constructor { target: *target }, binding.unit)
            }))
            .collect();
        out.sort();
        out
    }

    pub fn units(&self) -> &[UnitSummary] {
        &self.units
    }

    /// Number of registered routines, constructors included
    pub fn len(&self) -> usize {
        self.operators.len() + self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bind;
    use crate::construct::new_sparse_matrix;
    use crate::value::HostType;
    use polysparse_core::{NonSymmetric, Rational, SparseMatrix};

    type M = SparseMatrix<Rational>;

    fn scaling_unit(registry: &mut RegistryBuilder) {
        registry.operator(
            OperatorKind::BinaryMul,
            &[TypeTag::Int, <M as HostType>::TAG],
            bind::binary_mul::<i64, M>,
        );
        registry.constructor(<M as HostType>::TAG, new_sparse_matrix::<Rational, NonSymmetric>);
    }

    fn duplicate_unit(registry: &mut RegistryBuilder) {
        registry.operator(
            OperatorKind::BinaryMul,
            &[TypeTag::Int, <M as HostType>::TAG],
            bind::binary_mul::<i64, M>,
        );
    }

    fn registry() -> OperatorRegistry {
        OperatorRegistry::from_units(&[
            Unit {
                name: "a_0",
                register: scaling_unit,
            },
            Unit {
                name: "b_0",
                register: duplicate_unit,
            },
        ])
    }

    #[test]
    fn test_first_registration_wins() {
        let registry = registry();
        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.units(),
            &[
                UnitSummary { name: "a_0", routines: 2 },
                UnitSummary { name: "b_0", routines: 0 }
            ]
        );
    }

    #[test]
    fn test_dispatch_and_unknown_signature() {
        let registry = registry();
        let table = HandleTable::default();
        let one = table.acquire(Rational::from_int(1)).unwrap();
        let m = registry
            .construct(&table, <M as HostType>::TAG, 2, 2, &[(0, 0, one)])
            .unwrap();
        let k = table.acquire(4i64).unwrap();

        let out = registry.dispatch(&table, OperatorKind::BinaryMul, &[k, m]).unwrap();
        assert_eq!(
            table.resolve::<M>(out).unwrap().get(0, 0).unwrap(),
            Rational::from_int(4)
        );

        let err = registry.dispatch(&table, OperatorKind::BinaryMul, &[m, k]).unwrap_err();
        assert_eq!(
            err,
            HostError::UnknownOperator {
                op: "Binary_mul".to_string(),
                signature: "SparseMatrix<Rational, NonSymmetric>, Int".to_string()
            }
        );
    }

    #[test]
    fn test_missing_declarations() {
        let manifest = Manifest::parse(
            "Binary_mul(Int, SparseMatrix<Rational, NonSymmetric>)\n\
             Transpose(SparseMatrix<Rational, NonSymmetric>)\n",
        )
        .unwrap();
        let missing = registry().missing(&manifest);
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].to_string(), "Transpose(SparseMatrix<Rational, NonSymmetric>)");
    }
}
