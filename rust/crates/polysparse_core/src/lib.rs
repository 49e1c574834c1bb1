//! Polysparse Core Library
//!
//! Exact sparse matrix algebra over arbitrary-precision coefficient rings.
//!
//! # Overview
//!
//! Matrices are generic over their coefficient ring and a type-level
//! symmetry policy, so a symmetric and a non-symmetric matrix are distinct
//! types that never convert implicitly. All algebra is value-semantic:
//! operands are never mutated and every result is a fresh matrix.
//!
//! # Key Components
//!
//! - [`rational`] - Exact rational number type
//! - [`coefficient`] - Coefficient rings and the scalars that may scale them
//! - [`symmetry`] - `NonSymmetric` / `Symmetric` storage policies
//! - [`store`] - Ordered sparse cell storage
//! - [`matrix`] - The sparse matrix and its builder
//! - [`shape`] - Shape and index preconditions shared with validating callers

pub mod coefficient;
pub mod error;
pub mod matrix;
pub mod rational;
pub mod shape;
pub mod store;
pub mod symmetry;

pub use coefficient::{Coefficient, Integer, Scalar};
pub use error::{AlgebraError, Result};
pub use matrix::{SparseMatrix, SparseMatrixBuilder};
pub use rational::Rational;
pub use shape::Shape;
pub use store::{Entries, SparseStore};
pub use symmetry::{NonSymmetric, Symmetric, Symmetry, SymmetryJoin, SymmetryKind};
