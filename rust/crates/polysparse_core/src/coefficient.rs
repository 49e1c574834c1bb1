//! Coefficient domains and scalar operands
//!
//! A [`Coefficient`] is an exact ring the matrix entries live in. A
//! [`Scalar`] is anything that may scale a matrix over a given coefficient
//! ring; which pairs exist is decided here at the type level.

use num_bigint::BigInt;
use num_traits::{One, Zero};
use std::fmt::{Debug, Display};

use crate::rational::Rational;

/// Arbitrary-precision integer coefficient domain
pub type Integer = BigInt;

/// Exact ring usable as a matrix entry type
pub trait Coefficient: Clone + PartialEq + Debug + Display + Send + Sync + 'static {
    /// Name used in type signatures, e.g. `Rational`
    const NAME: &'static str;

    fn zero() -> Self;
    fn one() -> Self;
    fn is_zero(&self) -> bool;
    fn plus(&self, other: &Self) -> Self;
    fn minus(&self, other: &Self) -> Self;
    fn times(&self, other: &Self) -> Self;
    fn negated(&self) -> Self;
}

impl Coefficient for Rational {
    const NAME: &'static str = "Rational";

    fn zero() -> Self {
        <Rational as Zero>::zero()
    }
    fn one() -> Self {
        <Rational as One>::one()
    }
    fn is_zero(&self) -> bool {
        Zero::is_zero(self)
    }
    fn plus(&self, other: &Self) -> Self {
        self + other
    }
    fn minus(&self, other: &Self) -> Self {
        self - other
    }
    fn times(&self, other: &Self) -> Self {
        self * other
    }
    fn negated(&self) -> Self {
        -self
    }
}

impl Coefficient for Integer {
    const NAME: &'static str = "Integer";

    fn zero() -> Self {
        <BigInt as Zero>::zero()
    }
    fn one() -> Self {
        <BigInt as One>::one()
    }
    fn is_zero(&self) -> bool {
        Zero::is_zero(self)
    }
    fn plus(&self, other: &Self) -> Self {
        self + other
    }
    fn minus(&self, other: &Self) -> Self {
        self - other
    }
    fn times(&self, other: &Self) -> Self {
        self * other
    }
    fn negated(&self) -> Self {
        -self
    }
}

/// A value that can scale a matrix over `C`
pub trait Scalar<C: Coefficient> {
    fn to_coefficient(&self) -> C;
}

impl Scalar<Rational> for i64 {
    fn to_coefficient(&self) -> Rational {
        Rational::from_int(*self)
    }
}

impl Scalar<Integer> for i64 {
    fn to_coefficient(&self) -> Integer {
        BigInt::from(*self)
    }
}

impl Scalar<Rational> for Integer {
    fn to_coefficient(&self) -> Rational {
        Rational::from_int(self.clone())
    }
}

impl Scalar<Integer> for Integer {
    fn to_coefficient(&self) -> Integer {
        self.clone()
    }
}

impl Scalar<Rational> for Rational {
    fn to_coefficient(&self) -> Rational {
        self.clone()
    }
}
