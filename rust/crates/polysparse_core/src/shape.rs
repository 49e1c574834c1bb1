//! Shape and index preconditions
//!
//! These are the only places the kernel decides whether operands fit
//! together. The checked matrix operations call them before the
//! `*_prechecked` routines; a validation layer may call them on its own and
//! then go straight to the prechecked routines.

use crate::error::{AlgebraError, Result};

pub type Shape = (usize, usize);

/// Operands of `+` and `-` must have identical shape
pub fn check_same_shape(op: &'static str, left: Shape, right: Shape) -> Result<()> {
    if left == right {
        Ok(())
    } else {
        Err(AlgebraError::ShapeMismatch { op, left, right })
    }
}

/// `left.cols == right.rows`
pub fn check_product(left: Shape, right: Shape) -> Result<()> {
    if left.1 == right.0 {
        Ok(())
    } else {
        Err(AlgebraError::ShapeMismatch {
            op: "multiply",
            left,
            right,
        })
    }
}

pub fn check_index(shape: Shape, row: usize, col: usize) -> Result<()> {
    if row < shape.0 && col < shape.1 {
        Ok(())
    } else {
        Err(AlgebraError::IndexOutOfBounds {
            row,
            col,
            rows: shape.0,
            cols: shape.1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_shapes() {
        assert!(check_product((1, 2), (2, 7)).is_ok());
        assert!(matches!(
            check_product((2, 2), (3, 3)),
            Err(AlgebraError::ShapeMismatch { op: "multiply", .. })
        ));
    }

    #[test]
    fn test_index_bounds() {
        assert!(check_index((2, 3), 1, 2).is_ok());
        assert_eq!(
            check_index((2, 3), 2, 0),
            Err(AlgebraError::IndexOutOfBounds { row: 2, col: 0, rows: 2, cols: 3 })
        );
    }
}
