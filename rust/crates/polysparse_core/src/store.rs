//! Ordered sparse cell storage
//!
//! Cells are keyed by `(row, col)` in a `BTreeMap`, which gives row-major
//! iteration for free. Zero is never stored: any write that produces the
//! additive identity removes the cell instead.

use std::collections::btree_map::{self, BTreeMap, Entry};
use std::fmt;
use std::marker::PhantomData;

use crate::coefficient::Coefficient;
use crate::error::Result;
use crate::shape::{check_index, Shape};
use crate::symmetry::Symmetry;

/// Sparse row map: row index to `(col, value)` pairs sorted by column
pub type LogicalRows<'a, C> = BTreeMap<usize, Vec<(usize, &'a C)>>;

pub struct SparseStore<C, S> {
    rows: usize,
    cols: usize,
    cells: BTreeMap<(usize, usize), C>,
    _policy: PhantomData<S>,
}

impl<C: Coefficient, S: Symmetry> SparseStore<C, S> {
    /// Empty store of the given shape
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        S::check_shape(rows, cols)?;
        Ok(Self {
            rows,
            cols,
            cells: BTreeMap::new(),
            _policy: PhantomData,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> Shape {
        (self.rows, self.cols)
    }

    /// Number of stored cells (for `Symmetric`, the upper triangle only)
    pub fn nnz(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Stored value at a logical cell, `None` meaning zero
    pub fn get_ref(&self, row: usize, col: usize) -> Option<&C> {
        self.cells.get(&S::canonical(row, col))
    }

    /// Value at a logical cell, zero if absent
    pub fn get(&self, row: usize, col: usize) -> Result<C> {
        check_index(self.shape(), row, col)?;
        Ok(self.get_ref(row, col).cloned().unwrap_or_else(C::zero))
    }

    /// Overwrite a logical cell; writing zero erases it
    pub fn set(&mut self, row: usize, col: usize, value: C) -> Result<()> {
        check_index(self.shape(), row, col)?;
        let key = S::canonical(row, col);
        if value.is_zero() {
            self.cells.remove(&key);
        } else {
            self.cells.insert(key, value);
        }
        Ok(())
    }

    /// Add `value` into a logical cell; a sum that cancels erases it
    pub fn accumulate(&mut self, row: usize, col: usize, value: &C) -> Result<()> {
        check_index(self.shape(), row, col)?;
        if value.is_zero() {
            return Ok(());
        }
        match self.cells.entry(S::canonical(row, col)) {
            Entry::Vacant(slot) => {
                slot.insert(value.clone());
            }
            Entry::Occupied(mut slot) => {
                let sum = slot.get().plus(value);
                if sum.is_zero() {
                    slot.remove();
                } else {
                    *slot.get_mut() = sum;
                }
            }
        }
        Ok(())
    }

    /// Write a cell the caller already knows to be in range
    pub(crate) fn put(&mut self, row: usize, col: usize, value: C) {
        debug_assert!(row < self.rows && col < self.cols);
        if !value.is_zero() {
            self.cells.insert(S::canonical(row, col), value);
        }
    }

    /// Stored cells in row-major order. Each call starts a fresh pass.
    pub fn entries(&self) -> Entries<'_, C> {
        Entries {
            inner: self.cells.iter(),
        }
    }

    /// Logical nonzeros grouped by row, each row sorted by column.
    ///
    /// Only rows holding at least one logical nonzero appear, so the cost
    /// follows the stored cells and never the declared row count. For
    /// `Symmetric` the lower triangle is reconstructed from the stored upper
    /// one. Rows come out sorted without an extra pass: mirrored cells of row
    /// `j` all have column `< j` and are pushed before row `j`'s own cells.
    pub fn logical_rows(&self) -> LogicalRows<'_, C> {
        let mut rows: LogicalRows<'_, C> = BTreeMap::new();
        let mirror = S::KIND == crate::symmetry::SymmetryKind::Symmetric;
        for (&(i, j), v) in &self.cells {
            rows.entry(i).or_default().push((j, v));
            if mirror && i != j {
                rows.entry(j).or_default().push((i, v));
            }
        }
        rows
    }

    /// New store holding `f(v)` for every stored `v`, dropping zeros
    pub fn map_nonzero<F: Fn(&C) -> C>(&self, f: F) -> Self {
        let cells = self
            .cells
            .iter()
            .filter_map(|(&k, v)| {
                let mapped = f(v);
                (!mapped.is_zero()).then_some((k, mapped))
            })
            .collect();
        Self {
            rows: self.rows,
            cols: self.cols,
            cells,
            _policy: PhantomData,
        }
    }
}

impl<C: Clone, S> Clone for SparseStore<C, S> {
    fn clone(&self) -> Self {
        Self {
            rows: self.rows,
            cols: self.cols,
            cells: self.cells.clone(),
            _policy: PhantomData,
        }
    }
}

impl<C: PartialEq, S> PartialEq for SparseStore<C, S> {
    fn eq(&self, other: &Self) -> bool {
        self.rows == other.rows && self.cols == other.cols && self.cells == other.cells
    }
}

impl<C: fmt::Debug, S: Symmetry> fmt::Debug for SparseStore<C, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SparseStore")
            .field("policy", &S::KIND)
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .field("cells", &self.cells)
            .finish()
    }
}

/// Row-major iterator over stored cells
#[derive(Clone)]
pub struct Entries<'a, C> {
    inner: btree_map::Iter<'a, (usize, usize), C>,
}

impl<'a, C> Iterator for Entries<'a, C> {
    type Item = (usize, usize, &'a C);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(&(i, j), v)| (i, j, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<C> ExactSizeIterator for Entries<'_, C> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AlgebraError;
    use crate::rational::Rational;
    use crate::symmetry::{NonSymmetric, Symmetric};

    fn r(n: i64) -> Rational {
        Rational::from_int(n)
    }

    #[test]
    fn test_zero_is_never_stored() {
        let mut s = SparseStore::<Rational, NonSymmetric>::new(2, 2).unwrap();
        s.set(0, 1, r(3)).unwrap();
        assert_eq!(s.nnz(), 1);
        s.set(0, 1, r(0)).unwrap();
        assert!(s.is_empty());

        s.accumulate(1, 1, &r(2)).unwrap();
        s.accumulate(1, 1, &r(-2)).unwrap();
        assert!(s.is_empty());
    }

    #[test]
    fn test_symmetric_mirrors_reads_and_writes() {
        let mut s = SparseStore::<Rational, Symmetric>::new(3, 3).unwrap();
        s.set(2, 0, r(7)).unwrap();
        assert_eq!(s.get(0, 2), Ok(r(7)));
        assert_eq!(s.get(2, 0), Ok(r(7)));
        assert_eq!(s.nnz(), 1);
        assert_eq!(s.entries().next(), Some((0, 2, &r(7))));
    }

    #[test]
    fn test_entries_are_row_major_and_restartable() {
        let mut s = SparseStore::<Rational, NonSymmetric>::new(3, 3).unwrap();
        s.set(2, 0, r(1)).unwrap();
        s.set(0, 2, r(2)).unwrap();
        s.set(0, 1, r(3)).unwrap();
        let first: Vec<_> = s.entries().map(|(i, j, _)| (i, j)).collect();
        assert_eq!(first, vec![(0, 1), (0, 2), (2, 0)]);
        let second: Vec<_> = s.entries().map(|(i, j, _)| (i, j)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_logical_rows_rebuild_lower_triangle() {
        let mut s = SparseStore::<Rational, Symmetric>::new(3, 3).unwrap();
        s.set(0, 1, r(1)).unwrap();
        s.set(1, 1, r(2)).unwrap();
        s.set(1, 2, r(3)).unwrap();
        let rows = s.logical_rows();
        let cols: Vec<(usize, Vec<usize>)> = rows
            .iter()
            .map(|(&i, row)| (i, row.iter().map(|&(j, _)| j).collect()))
            .collect();
        assert_eq!(cols, vec![(0, vec![1]), (1, vec![0, 1, 2]), (2, vec![1])]);
    }

    #[test]
    fn test_logical_rows_skip_empty_rows() {
        let mut s = SparseStore::<Rational, Symmetric>::new(usize::MAX, usize::MAX).unwrap();
        s.set(usize::MAX - 1, 3, r(5)).unwrap();
        let rows = s.logical_rows();
        let keys: Vec<usize> = rows.keys().copied().collect();
        assert_eq!(keys, vec![3, usize::MAX - 1]);
        assert_eq!(rows[&3], vec![(usize::MAX - 1, &r(5))]);
    }

    #[test]
    fn test_out_of_range_write_is_rejected() {
        let mut s = SparseStore::<Rational, NonSymmetric>::new(2, 2).unwrap();
        assert!(s.set(2, 0, r(1)).is_err());
        assert!(s.accumulate(0, 5, &r(1)).is_err());
    }

    #[test]
    fn test_out_of_range_read_is_rejected() {
        let s = SparseStore::<Rational, Symmetric>::new(2, 2).unwrap();
        assert_eq!(s.get(1, 0), Ok(r(0)));
        assert_eq!(
            s.get(0, 2),
            Err(AlgebraError::IndexOutOfBounds {
                row: 0,
                col: 2,
                rows: 2,
                cols: 2
            })
        );
    }
}
