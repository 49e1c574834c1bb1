//! Type-level symmetry policies
//!
//! `NonSymmetric` stores every cell. `Symmetric` stores only the upper
//! triangle (`row <= col`) and folds every access onto it.

use std::fmt::Debug;

use crate::error::{AlgebraError, Result};

/// Runtime mirror of a symmetry policy, used in type signatures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SymmetryKind {
    NonSymmetric,
    Symmetric,
}

impl SymmetryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NonSymmetric => "NonSymmetric",
            Self::Symmetric => "Symmetric",
        }
    }
}

/// Storage policy for a sparse matrix
pub trait Symmetry: Copy + Default + Debug + Send + Sync + 'static {
    const KIND: SymmetryKind;

    /// Map a logical cell to the cell that actually holds its value
    fn canonical(row: usize, col: usize) -> (usize, usize);

    /// Reject shapes this policy cannot represent
    fn check_shape(rows: usize, cols: usize) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NonSymmetric;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Symmetric;

impl Symmetry for NonSymmetric {
    const KIND: SymmetryKind = SymmetryKind::NonSymmetric;

    #[inline]
    fn canonical(row: usize, col: usize) -> (usize, usize) {
        (row, col)
    }

    fn check_shape(_rows: usize, _cols: usize) -> Result<()> {
        Ok(())
    }
}

impl Symmetry for Symmetric {
    const KIND: SymmetryKind = SymmetryKind::Symmetric;

    #[inline]
    fn canonical(row: usize, col: usize) -> (usize, usize) {
        if row <= col {
            (row, col)
        } else {
            (col, row)
        }
    }

    fn check_shape(rows: usize, cols: usize) -> Result<()> {
        if rows == cols {
            Ok(())
        } else {
            Err(AlgebraError::NotSquare { rows, cols })
        }
    }
}

/// Symmetry of the sum of two matrices with policies `Self` and `Rhs`
///
/// Only two symmetric operands are guaranteed to sum to a symmetric matrix.
pub trait SymmetryJoin<Rhs: Symmetry>: Symmetry {
    type Output: Symmetry;
}

impl SymmetryJoin<Symmetric> for Symmetric {
    type Output = Symmetric;
}

impl SymmetryJoin<NonSymmetric> for Symmetric {
    type Output = NonSymmetric;
}

impl SymmetryJoin<Symmetric> for NonSymmetric {
    type Output = NonSymmetric;
}

impl SymmetryJoin<NonSymmetric> for NonSymmetric {
    type Output = NonSymmetric;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symmetric_folds_lower_triangle() {
        assert_eq!(Symmetric::canonical(3, 1), (1, 3));
        assert_eq!(Symmetric::canonical(1, 3), (1, 3));
        assert_eq!(NonSymmetric::canonical(3, 1), (3, 1));
    }

    #[test]
    fn test_shape_rules() {
        assert!(NonSymmetric::check_shape(2, 5).is_ok());
        assert!(Symmetric::check_shape(4, 4).is_ok());
        assert_eq!(Symmetric::check_shape(2, 3), Err(AlgebraError::NotSquare { rows: 2, cols: 3 }));
    }
}
