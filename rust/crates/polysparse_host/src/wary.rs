//! Validation gate between host calls and the algebra kernel
//!
//! Every host-reachable routine goes through here in the same order:
//!
//! 1. operand types, when an [`Operand`] is resolved from its handle
//! 2. operand shapes, inside the `Wary*` trait impls
//! 3. explicit indices, via [`check_indices`] or [`WaryElement`]
//!
//! Only then is the `*_prechecked` kernel routine called, so each check runs
//! exactly once per operation.

use std::sync::Arc;

use num_bigint::BigInt;
use polysparse_core::shape::{check_index, check_product, check_same_shape};
use polysparse_core::{NonSymmetric, Rational, Scalar, Shape, SparseMatrix, Symmetry, SymmetryJoin};

use crate::error::{HostError, Result};
use crate::handle::{HandleTable, HostHandle};
use crate::value::{HostCoefficient, HostType};

/// An operand resolved from the handle table and checked against `T`.
///
/// Holds its own reference to the referent for the duration of the call.
pub struct Operand<T> {
    handle: HostHandle,
    value: Arc<T>,
}

impl<T: HostType> Operand<T> {
    pub fn resolve(table: &HandleTable, handle: HostHandle) -> Result<Self> {
        if handle.tag() != T::TAG {
            return Err(HostError::mismatch(T::TAG, handle.tag()));
        }
        let value = table.resolve::<T>(handle)?;
        Ok(Self { handle, value })
    }

    pub fn handle(&self) -> HostHandle {
        self.handle
    }

    pub fn wary(&self) -> Wary<'_, T> {
        Wary(&self.value)
    }
}

/// A borrowed operand whose type has been checked but whose shape has not
#[derive(Debug, Clone, Copy)]
pub struct Wary<'a, T>(&'a T);

impl<'a, T> Wary<'a, T> {
    pub fn new(value: &'a T) -> Self {
        Wary(value)
    }

    pub fn get(&self) -> &'a T {
        self.0
    }
}

/// Convert a host-side index or dimension
pub fn to_index(value: i64) -> Result<usize> {
    usize::try_from(value).map_err(|_| HostError::NegativeIndex(value))
}

/// Validate explicit `(row, col)` pairs against a shape
pub fn check_indices(shape: Shape, indices: &[(i64, i64)]) -> Result<Vec<(usize, usize)>> {
    indices
        .iter()
        .map(|&(row, col)| -> Result<(usize, usize)> {
            let (row, col) = (to_index(row)?, to_index(col)?);
            check_index(shape, row, col)?;
            Ok((row, col))
        })
        .collect()
}

pub trait WaryMul<Rhs: HostType>: HostType {
    type Output: HostType;
    fn wary_mul(lhs: Wary<'_, Self>, rhs: Wary<'_, Rhs>) -> Result<Self::Output>;
}

pub trait WaryAdd<Rhs: HostType>: HostType {
    type Output: HostType;
    fn wary_add(lhs: Wary<'_, Self>, rhs: Wary<'_, Rhs>) -> Result<Self::Output>;
}

pub trait WarySub<Rhs: HostType>: HostType {
    type Output: HostType;
    fn wary_sub(lhs: Wary<'_, Self>, rhs: Wary<'_, Rhs>) -> Result<Self::Output>;
}

pub trait WaryDiv<Rhs: HostType>: HostType {
    type Output: HostType;
    fn wary_div(lhs: Wary<'_, Self>, rhs: Wary<'_, Rhs>) -> Result<Self::Output>;
}

pub trait WaryEq<Rhs: HostType = Self>: HostType {
    fn wary_eq(lhs: Wary<'_, Self>, rhs: Wary<'_, Rhs>) -> Result<bool>;
}

pub trait WaryNeg: HostType {
    type Output: HostType;
    fn wary_neg(operand: Wary<'_, Self>) -> Result<Self::Output>;
}

pub trait WaryTranspose: HostType {
    type Output: HostType;
    fn wary_transpose(operand: Wary<'_, Self>) -> Result<Self::Output>;
}

pub trait WaryElement: HostType {
    type Output: HostType;
    fn wary_element(operand: Wary<'_, Self>, row: i64, col: i64) -> Result<Self::Output>;
}

// scalar * matrix, matrix * scalar, matrix / scalar
macro_rules! scalar_ops {
    ($($scalar:ty),* $(,)?) => {
        $(
            impl<C, S> WaryMul<SparseMatrix<C, S>> for $scalar
            where
                C: HostCoefficient,
                S: Symmetry,
                $scalar: Scalar<C>,
            {
                type Output = SparseMatrix<C, S>;

                fn wary_mul(
                    lhs: Wary<'_, Self>,
                    rhs: Wary<'_, SparseMatrix<C, S>>,
                ) -> Result<Self::Output> {
                    Ok(rhs.get().scale(lhs.get()))
                }
            }

            impl<C, S> WaryMul<$scalar> for SparseMatrix<C, S>
            where
                C: HostCoefficient,
                S: Symmetry,
                $scalar: Scalar<C>,
            {
                type Output = SparseMatrix<C, S>;

                fn wary_mul(lhs: Wary<'_, Self>, rhs: Wary<'_, $scalar>) -> Result<Self::Output> {
                    Ok(lhs.get().scale(rhs.get()))
                }
            }

            impl<S: Symmetry> WaryDiv<$scalar> for SparseMatrix<Rational, S> {
                type Output = SparseMatrix<Rational, S>;

                fn wary_div(lhs: Wary<'_, Self>, rhs: Wary<'_, $scalar>) -> Result<Self::Output> {
                    let divisor: Rational = rhs.get().to_coefficient();
                    Ok(lhs.get().scale(&divisor.recip()?))
                }
            }
        )*
    };
}

scalar_ops!(i64, BigInt, Rational);

impl<C, S1, S2> WaryMul<SparseMatrix<C, S2>> for SparseMatrix<C, S1>
where
    C: HostCoefficient,
    S1: Symmetry,
    S2: Symmetry,
{
    type Output = SparseMatrix<C, NonSymmetric>;

    fn wary_mul(lhs: Wary<'_, Self>, rhs: Wary<'_, SparseMatrix<C, S2>>) -> Result<Self::Output> {
        check_product(lhs.get().shape(), rhs.get().shape())?;
        Ok(lhs.get().mul_prechecked(rhs.get()))
    }
}

impl<C, S1, S2> WaryAdd<SparseMatrix<C, S2>> for SparseMatrix<C, S1>
where
    C: HostCoefficient,
    S1: SymmetryJoin<S2>,
    S2: Symmetry,
{
    type Output = SparseMatrix<C, S1::Output>;

    fn wary_add(lhs: Wary<'_, Self>, rhs: Wary<'_, SparseMatrix<C, S2>>) -> Result<Self::Output> {
        check_same_shape("add", lhs.get().shape(), rhs.get().shape())?;
        Ok(lhs.get().add_prechecked(rhs.get()))
    }
}

impl<C, S1, S2> WarySub<SparseMatrix<C, S2>> for SparseMatrix<C, S1>
where
    C: HostCoefficient,
    S1: SymmetryJoin<S2>,
    S2: Symmetry,
{
    type Output = SparseMatrix<C, S1::Output>;

    fn wary_sub(lhs: Wary<'_, Self>, rhs: Wary<'_, SparseMatrix<C, S2>>) -> Result<Self::Output> {
        check_same_shape("subtract", lhs.get().shape(), rhs.get().shape())?;
        Ok(lhs.get().sub_prechecked(rhs.get()))
    }
}

impl<C: HostCoefficient, S: Symmetry> WaryEq for SparseMatrix<C, S> {
    // differently shaped matrices are simply unequal
    fn wary_eq(lhs: Wary<'_, Self>, rhs: Wary<'_, Self>) -> Result<bool> {
        Ok(lhs.get() == rhs.get())
    }
}

impl<C: HostCoefficient, S: Symmetry> WaryNeg for SparseMatrix<C, S> {
    type Output = Self;

    fn wary_neg(operand: Wary<'_, Self>) -> Result<Self::Output> {
        Ok(operand.get().negate())
    }
}

impl<C: HostCoefficient, S: Symmetry> WaryTranspose for SparseMatrix<C, S> {
    type Output = Self;

    fn wary_transpose(operand: Wary<'_, Self>) -> Result<Self::Output> {
        Ok(operand.get().transpose())
    }
}

impl<C: HostCoefficient, S: Symmetry> WaryElement for SparseMatrix<C, S> {
    type Output = C;

    fn wary_element(operand: Wary<'_, Self>, row: i64, col: i64) -> Result<C> {
        let (row, col) = (to_index(row)?, to_index(col)?);
        Ok(operand.get().get(row, col)?)
    }
}

impl WaryMul<Rational> for Rational {
    type Output = Rational;

    fn wary_mul(lhs: Wary<'_, Self>, rhs: Wary<'_, Rational>) -> Result<Rational> {
        Ok(lhs.get() * rhs.get())
    }
}

impl WaryAdd<Rational> for Rational {
    type Output = Rational;

    fn wary_add(lhs: Wary<'_, Self>, rhs: Wary<'_, Rational>) -> Result<Rational> {
        Ok(lhs.get() + rhs.get())
    }
}

impl WarySub<Rational> for Rational {
    type Output = Rational;

    fn wary_sub(lhs: Wary<'_, Self>, rhs: Wary<'_, Rational>) -> Result<Rational> {
        Ok(lhs.get() - rhs.get())
    }
}

impl WaryDiv<Rational> for Rational {
    type Output = Rational;

    fn wary_div(lhs: Wary<'_, Self>, rhs: Wary<'_, Rational>) -> Result<Rational> {
        Ok(lhs.get().checked_div(rhs.get())?)
    }
}

impl WaryEq for Rational {
    fn wary_eq(lhs: Wary<'_, Self>, rhs: Wary<'_, Self>) -> Result<bool> {
        Ok(lhs.get() == rhs.get())
    }
}

impl WaryNeg for Rational {
    type Output = Rational;

    fn wary_neg(operand: Wary<'_, Self>) -> Result<Rational> {
        Ok(-operand.get())
    }
}
