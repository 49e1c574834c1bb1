//! Matrix construction from host-supplied triples

use polysparse_core::{SparseMatrix, SparseMatrixBuilder, Symmetry};

use crate::error::Result;
use crate::handle::{HandleTable, HostHandle};
use crate::value::{HostCoefficient, HostType};
use crate::wary::{check_indices, to_index, Operand};

/// `(row, col, value handle)` as passed by a host
pub type Triple = (i64, i64, HostHandle);

/// Build a `SparseMatrix<C, S>` and return a handle to it.
///
/// Value handles must hold exactly `C`; duplicate positions are summed and
/// entries that end up zero are dropped.
pub fn new_sparse_matrix<C, S>(
    table: &HandleTable,
    rows: i64,
    cols: i64,
    triples: &[Triple],
) -> Result<HostHandle>
where
    C: HostCoefficient,
    S: Symmetry,
{
    let values = triples
        .iter()
        .map(|&(_, _, value)| Operand::<C>::resolve(table, value))
        .collect::<Result<Vec<_>>>()?;

    let (rows, cols) = (to_index(rows)?, to_index(cols)?);
    let mut builder = SparseMatrixBuilder::<C, S>::new(rows, cols)?;

    let positions: Vec<(i64, i64)> = triples.iter().map(|&(row, col, _)| (row, col)).collect();
    let cells = check_indices((rows, cols), &positions)?;

    for ((row, col), value) in cells.into_iter().zip(&values) {
        builder.push(row, col, value.wary().get().clone())?;
    }
    let matrix = builder.finish();
    let tag = <SparseMatrix<C, S> as HostType>::TAG;
    tracing::debug!(
        tag = %tag,
        rows,
        cols,
        nnz = matrix.nnz(),
        "constructed matrix"
    );
    table.acquire(matrix)
}
