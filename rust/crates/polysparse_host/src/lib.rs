//! Polysparse Host Layer
//!
//! Exposes the polysparse kernel to a dynamically typed host.
//!
//! # Overview
//!
//! A host never sees Rust types. It holds opaque [`HostHandle`]s tagged with
//! a [`TypeTag`], invokes operators by name with a list of handles, and gets
//! back either a fresh handle or a [`HostError`]. Behind that boundary:
//!
//! - [`HandleTable`] owns every value and counts host references
//! - [`wary`] validates operand types, shapes and indices before any
//!   arithmetic runs
//! - [`OperatorRegistry`] maps `(operator, signature)` to one concrete routine
//!   per signature, generated at build time from `instances.manifest` and
//!   split into units of at most `max.instances` routines
//!
//! # Example
//!
//! ```no_run
//! use polysparse_core::Rational;
//! use polysparse_host::{OperatorKind, Session, TypeTag};
//!
//! let session = Session::default();
//! let half = session.put(Rational::from_pair(1, 2).unwrap()).unwrap();
//! let target: TypeTag = "SparseMatrix<Rational, NonSymmetric>".parse().unwrap();
//! let m = session.construct(target, 2, 2, &[(0, 0, half)]).unwrap();
//! let four = session.put(4i64).unwrap();
//! let scaled = session.call(OperatorKind::BinaryMul, &[four, m]).unwrap();
//! println!("{}", session.render(scaled).unwrap());
//! ```

pub mod bind;
pub mod config;
pub mod construct;
pub mod error;
pub mod handle;
mod instances;
pub mod manifest;
pub mod registry;
pub mod session;
pub mod tag;
pub mod value;
pub mod wary;

pub use config::SessionConfig;
pub use construct::Triple;
pub use error::{ErrorKind, HostError, Result};
pub use handle::{HandleId, HandleTable, HostHandle};
pub use manifest::{Declaration, Manifest, OperatorKind};
pub use registry::{OperatorRegistry, UnitSummary};
pub use session::{MatrixExport, Session};
pub use tag::{CoefficientKind, TypeTag};
pub use value::{HostCoefficient, HostType};
