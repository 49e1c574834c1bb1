//! Rust types that can live behind a host handle

use std::any::Any;

use num_bigint::BigInt;
use polysparse_core::{Coefficient, Integer, Rational, SparseMatrix, Symmetry};

use crate::tag::{CoefficientKind, TypeTag};

/// A value the handle table can own. `TAG` is what the host sees.
pub trait HostType: Any + Send + Sync + Sized {
    const TAG: TypeTag;
}

/// Coefficient rings exposed to hosts
pub trait HostCoefficient: Coefficient + HostType {
    const KIND: CoefficientKind;
}

impl HostType for bool {
    const TAG: TypeTag = TypeTag::Bool;
}

impl HostType for i64 {
    const TAG: TypeTag = TypeTag::Int;
}

impl HostType for BigInt {
    const TAG: TypeTag = TypeTag::Integer;
}

impl HostType for Rational {
    const TAG: TypeTag = TypeTag::Rational;
}

impl HostCoefficient for Integer {
    const KIND: CoefficientKind = CoefficientKind::Integer;
}

impl HostCoefficient for Rational {
    const KIND: CoefficientKind = CoefficientKind::Rational;
}

impl<C: HostCoefficient, S: Symmetry> HostType for SparseMatrix<C, S> {
    const TAG: TypeTag = TypeTag::SparseMatrix(C::KIND, S::KIND);
}

#[cfg(test)]
mod tests {
    use super::*;
    use polysparse_core::{NonSymmetric, Symmetric, SymmetryKind};

    #[test]
    fn test_matrix_tags_follow_parameters() {
        assert_eq!(
            <SparseMatrix<Rational, Symmetric> as HostType>::TAG,
            TypeTag::SparseMatrix(CoefficientKind::Rational, SymmetryKind::Symmetric)
        );
        assert_eq!(
            <SparseMatrix<Integer, NonSymmetric> as HostType>::TAG.to_string(),
            "SparseMatrix<Integer, NonSymmetric>"
        );
        assert_eq!(<i64 as HostType>::TAG, TypeTag::Int);
    }
}
