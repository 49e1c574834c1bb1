//! Generic binding routines
//!
//! Each function here is one operator's calling convention: unpack the
//! host arguments, resolve them into typed operands, run the `Wary*` gate
//! and hand the result back as a fresh handle. The generated
//! instantiation units monomorphize these for every manifest signature.

use crate::error::{HostError, Result};
use crate::handle::{HandleTable, HostHandle};
use crate::manifest::OperatorKind;
use crate::value::HostType;
use crate::wary::{
    Operand, WaryAdd, WaryDiv, WaryElement, WaryEq, WaryMul, WaryNeg, WarySub, WaryTranspose,
};

fn expect_args<const N: usize>(op: OperatorKind, args: &[HostHandle]) -> Result<[HostHandle; N]> {
    <[HostHandle; N]>::try_from(args).map_err(|_| HostError::Arity {
        op,
        expected: N,
        found: args.len(),
    })
}

macro_rules! binary_binding {
    ($name:ident, $kind:ident, $gate:ident :: $method:ident) => {
        pub fn $name<L, R>(table: &HandleTable, args: &[HostHandle]) -> Result<HostHandle>
        where
            L: $gate<R>,
            R: HostType,
        {
            let [lhs, rhs] = expect_args(OperatorKind::$kind, args)?;
            let lhs = Operand::<L>::resolve(table, lhs)?;
            let rhs = Operand::<R>::resolve(table, rhs)?;
            table.acquire(L::$method(lhs.wary(), rhs.wary())?)
        }
    };
}

binary_binding!(binary_mul, BinaryMul, WaryMul::wary_mul);
binary_binding!(binary_add, BinaryAdd, WaryAdd::wary_add);
binary_binding!(binary_sub, BinarySub, WarySub::wary_sub);
binary_binding!(binary_div, BinaryDiv, WaryDiv::wary_div);
binary_binding!(binary_eq, BinaryEq, WaryEq::wary_eq);

pub fn unary_neg<T: WaryNeg>(table: &HandleTable, args: &[HostHandle]) -> Result<HostHandle> {
    let [operand] = expect_args(OperatorKind::UnaryNeg, args)?;
    let operand = Operand::<T>::resolve(table, operand)?;
    table.acquire(T::wary_neg(operand.wary())?)
}

pub fn transpose<T: WaryTranspose>(table: &HandleTable, args: &[HostHandle]) -> Result<HostHandle> {
    let [operand] = expect_args(OperatorKind::Transpose, args)?;
    let operand = Operand::<T>::resolve(table, operand)?;
    table.acquire(T::wary_transpose(operand.wary())?)
}

pub fn element<M: WaryElement>(table: &HandleTable, args: &[HostHandle]) -> Result<HostHandle> {
    let [matrix, row, col] = expect_args(OperatorKind::Element, args)?;
    let matrix = Operand::<M>::resolve(table, matrix)?;
    let row = Operand::<i64>::resolve(table, row)?;
    let col = Operand::<i64>::resolve(table, col)?;
    let value = M::wary_element(matrix.wary(), *row.wary().get(), *col.wary().get())?;
    table.acquire(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::TypeTag;
    use polysparse_core::{Rational, SparseMatrix};

    type M = SparseMatrix<Rational>;

    #[test]
    fn test_binding_round_trip() {
        let table = HandleTable::default();
        let m = table
            .acquire(M::from_triples(2, 2, vec![(0, 1, Rational::from_int(3))]).unwrap())
            .unwrap();
        let k = table.acquire(2i64).unwrap();

        let out = binary_mul::<i64, M>(&table, &[k, m]).unwrap();
        assert_eq!(out.tag(), <M as HostType>::TAG);
        let scaled = table.resolve::<M>(out).unwrap();
        assert_eq!(scaled.get(0, 1).unwrap(), Rational::from_int(6));
    }

    #[test]
    fn test_arity_and_type_are_checked() {
        let table = HandleTable::default();
        let k = table.acquire(2i64).unwrap();
        let q = table.acquire(Rational::from_int(1)).unwrap();

        assert_eq!(
            binary_mul::<i64, M>(&table, &[k]),
            Err(HostError::Arity {
                op: OperatorKind::BinaryMul,
                expected: 2,
                found: 1
            })
        );
        assert_eq!(
            binary_mul::<i64, M>(&table, &[k, q]),
            Err(HostError::TypeMismatch {
                expected: <M as HostType>::TAG,
                found: TypeTag::Rational
            })
        );
    }

    #[test]
    fn test_equality_yields_bool_handle() {
        let table = HandleTable::default();
        let a = table.acquire(Rational::from_int(1)).unwrap();
        let b = table.acquire(Rational::from_int(1)).unwrap();
        let out = binary_eq::<Rational, Rational>(&table, &[a, b]).unwrap();
        assert_eq!(out.tag(), TypeTag::Bool);
        assert!(*table.resolve::<bool>(out).unwrap());
    }
}
