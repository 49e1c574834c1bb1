//! Sparse matrix over an exact coefficient ring
//!
//! `SparseMatrix<C, S>` owns one [`SparseStore`] and exposes value-semantics
//! algebra: every operation returns a new matrix and leaves its operands
//! untouched. The only mutable phase is [`SparseMatrixBuilder`].
//!
//! Binary operations come in two flavours. `add`, `sub` and `mul` check
//! shapes and then call the matching `*_prechecked` routine; callers that
//! validated shapes themselves may call the prechecked routine directly.

use std::collections::btree_map::{BTreeMap, Entry};

use crate::coefficient::{Coefficient, Scalar};
use crate::error::Result;
use crate::shape::{check_product, check_same_shape, Shape};
use crate::store::{Entries, LogicalRows, SparseStore};
use crate::symmetry::{NonSymmetric, Symmetry, SymmetryJoin, SymmetryKind};

pub struct SparseMatrix<C, S = NonSymmetric> {
    store: SparseStore<C, S>,
}

impl<C: Coefficient, S: Symmetry> SparseMatrix<C, S> {
    /// All-zero matrix of the given shape
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        Ok(Self {
            store: SparseStore::new(rows, cols)?,
        })
    }

    pub fn identity(n: usize) -> Result<Self> {
        let mut store = SparseStore::new(n, n)?;
        for i in 0..n {
            store.put(i, i, C::one());
        }
        Ok(Self { store })
    }

    /// Build from `(row, col, value)` triples. Repeated cells are summed.
    pub fn from_triples<I>(rows: usize, cols: usize, triples: I) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, usize, C)>,
    {
        let mut builder = SparseMatrixBuilder::new(rows, cols)?;
        for (row, col, value) in triples {
            builder.push(row, col, value)?;
        }
        Ok(builder.finish())
    }

    pub fn rows(&self) -> usize {
        self.store.rows()
    }

    pub fn cols(&self) -> usize {
        self.store.cols()
    }

    pub fn shape(&self) -> Shape {
        self.store.shape()
    }

    /// Stored nonzeros; for `Symmetric` each off-diagonal pair counts once
    pub fn nnz(&self) -> usize {
        self.store.nnz()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn symmetry(&self) -> SymmetryKind {
        S::KIND
    }

    pub fn store(&self) -> &SparseStore<C, S> {
        &self.store
    }

    pub fn get(&self, row: usize, col: usize) -> Result<C> {
        self.store.get(row, col)
    }

    /// Stored cells in row-major order; feeding them back into
    /// [`SparseMatrix::from_triples`] reproduces this matrix.
    pub fn entries(&self) -> Entries<'_, C> {
        self.store.entries()
    }

    pub fn to_triples(&self) -> Vec<(usize, usize, C)> {
        self.entries().map(|(i, j, v)| (i, j, v.clone())).collect()
    }

    /// Logical nonzeros of each non-empty row, mirrored for `Symmetric`
    pub fn row_entries(&self) -> LogicalRows<'_, C> {
        self.store.logical_rows()
    }

    /// Every logical nonzero in row-major order
    fn logical_cells(&self) -> impl Iterator<Item = (usize, usize, &C)> {
        self.row_entries()
            .into_iter()
            .flat_map(|(i, row)| row.into_iter().map(move |(j, v)| (i, j, v)))
    }

    /// Every entry multiplied by `scalar`; scaling by zero gives the empty matrix
    pub fn scale<T>(&self, scalar: &T) -> Self
    where
        T: Scalar<C> + ?Sized,
    {
        let factor = scalar.to_coefficient();
        if factor.is_zero() {
            return Self {
                store: self.store.map_nonzero(|_| C::zero()),
            };
        }
        Self {
            store: self.store.map_nonzero(|v| v.times(&factor)),
        }
    }

    pub fn negate(&self) -> Self {
        Self {
            store: self.store.map_nonzero(C::negated),
        }
    }

    /// Transposed copy; a `Symmetric` matrix comes back unchanged
    pub fn transpose(&self) -> Self {
        let (rows, cols) = self.shape();
        let mut store = SparseStore::<C, S>::new(cols, rows)
            .unwrap_or_else(|_| unreachable!("a valid shape transposes to a valid shape"));
        for (i, j, v) in self.entries() {
            store.put(j, i, v.clone());
        }
        Self { store }
    }

    /// Same logical matrix with every cell stored independently
    pub fn to_nonsymmetric(&self) -> SparseMatrix<C, NonSymmetric> {
        let (rows, cols) = self.shape();
        let mut store = SparseStore::<C, NonSymmetric>::new(rows, cols)
            .unwrap_or_else(|_| unreachable!("NonSymmetric accepts every shape"));
        for (i, j, v) in self.logical_cells() {
            store.put(i, j, v.clone());
        }
        SparseMatrix { store }
    }

    pub fn add<S2>(&self, rhs: &SparseMatrix<C, S2>) -> Result<SparseMatrix<C, S::Output>>
    where
        S2: Symmetry,
        S: SymmetryJoin<S2>,
    {
        check_same_shape("add", self.shape(), rhs.shape())?;
        Ok(self.add_prechecked(rhs))
    }

    pub fn add_prechecked<S2>(&self, rhs: &SparseMatrix<C, S2>) -> SparseMatrix<C, S::Output>
    where
        S2: Symmetry,
        S: SymmetryJoin<S2>,
    {
        self.combine(rhs, |v| v.clone())
    }

    pub fn sub<S2>(&self, rhs: &SparseMatrix<C, S2>) -> Result<SparseMatrix<C, S::Output>>
    where
        S2: Symmetry,
        S: SymmetryJoin<S2>,
    {
        check_same_shape("subtract", self.shape(), rhs.shape())?;
        Ok(self.sub_prechecked(rhs))
    }

    pub fn sub_prechecked<S2>(&self, rhs: &SparseMatrix<C, S2>) -> SparseMatrix<C, S::Output>
    where
        S2: Symmetry,
        S: SymmetryJoin<S2>,
    {
        self.combine(rhs, C::negated)
    }

    /// Matrix product. The result is `NonSymmetric` whatever the operands.
    pub fn mul<S2: Symmetry>(
        &self,
        rhs: &SparseMatrix<C, S2>,
    ) -> Result<SparseMatrix<C, NonSymmetric>> {
        check_product(self.shape(), rhs.shape())?;
        Ok(self.mul_prechecked(rhs))
    }

    /// Row-by-row accumulation: only products of two stored nonzeros are
    /// ever formed, and each output row is a sparse accumulator.
    pub fn mul_prechecked<S2: Symmetry>(
        &self,
        rhs: &SparseMatrix<C, S2>,
    ) -> SparseMatrix<C, NonSymmetric> {
        let rows = self.rows();
        let cols = rhs.cols();
        let mut store = SparseStore::<C, NonSymmetric>::new(rows, cols)
            .unwrap_or_else(|_| unreachable!("NonSymmetric accepts every shape"));

        let rhs_rows = rhs.row_entries();
        for (i, lhs_row) in self.row_entries() {
            let mut acc: BTreeMap<usize, C> = BTreeMap::new();
            for (k, a_ik) in lhs_row {
                let Some(rhs_row) = rhs_rows.get(&k) else {
                    continue;
                };
                for &(j, b_kj) in rhs_row {
                    let product = a_ik.times(b_kj);
                    match acc.entry(j) {
                        Entry::Vacant(slot) => {
                            slot.insert(product);
                        }
                        Entry::Occupied(mut slot) => {
                            let sum = slot.get().plus(&product);
                            *slot.get_mut() = sum;
                        }
                    }
                }
            }
            for (j, v) in acc {
                store.put(i, j, v);
            }
        }
        SparseMatrix { store }
    }

    fn combine<S2, F>(&self, rhs: &SparseMatrix<C, S2>, rhs_sign: F) -> SparseMatrix<C, S::Output>
    where
        S2: Symmetry,
        S: SymmetryJoin<S2>,
        F: Fn(&C) -> C,
    {
        let (rows, cols) = self.shape();
        let mut store = SparseStore::<C, S::Output>::new(rows, cols)
            .unwrap_or_else(|_| unreachable!("operand shapes already satisfy the result policy"));

        // A symmetric result only arises from two symmetric operands, whose
        // stored cells are already canonical. Otherwise feed logical cells.
        let canonical = <S::Output as Symmetry>::KIND == SymmetryKind::Symmetric;
        let mut feed = |i: usize, j: usize, v: C| {
            store
                .accumulate(i, j, &v)
                .unwrap_or_else(|_| unreachable!("cells come from a matrix of the same shape"));
        };
        if canonical {
            for (i, j, v) in self.entries() {
                feed(i, j, v.clone());
            }
            for (i, j, v) in rhs.entries() {
                feed(i, j, rhs_sign(v));
            }
        } else {
            for (i, j, v) in self.logical_cells() {
                feed(i, j, v.clone());
            }
            for (i, j, v) in rhs.logical_cells() {
                feed(i, j, rhs_sign(v));
            }
        }
        SparseMatrix { store }
    }
}

impl<C: Clone, S> Clone for SparseMatrix<C, S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<C: PartialEq, S> PartialEq for SparseMatrix<C, S> {
    fn eq(&self, other: &Self) -> bool {
        self.store == other.store
    }
}

impl<C: std::fmt::Debug, S: Symmetry> std::fmt::Debug for SparseMatrix<C, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.store.fmt(f)
    }
}

/// Mutable construction phase for a [`SparseMatrix`]
pub struct SparseMatrixBuilder<C, S = NonSymmetric> {
    store: SparseStore<C, S>,
}

impl<C: Coefficient, S: Symmetry> SparseMatrixBuilder<C, S> {
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        Ok(Self {
            store: SparseStore::new(rows, cols)?,
        })
    }

    /// Add `value` into a cell, summing with anything already pushed there
    pub fn push(&mut self, row: usize, col: usize, value: C) -> Result<()> {
        self.store.accumulate(row, col, &value)
    }

    pub fn finish(self) -> SparseMatrix<C, S> {
        SparseMatrix { store: self.store }
    }
}
