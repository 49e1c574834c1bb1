//! Host session: a handle table bound to an operator registry

use std::fmt::Write as _;

use num_bigint::BigInt;
use polysparse_core::{NonSymmetric, Rational, SparseMatrix, Symmetric, Symmetry, SymmetryKind};
use serde::Serialize;

use crate::config::SessionConfig;
use crate::construct::Triple;
use crate::error::{HostError, Result};
use crate::handle::{HandleTable, HostHandle};
use crate::manifest::OperatorKind;
use crate::registry::OperatorRegistry;
use crate::tag::{CoefficientKind, TypeTag};
use crate::value::{HostCoefficient, HostType};

/// A matrix as handed back to a host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatrixExport {
    pub tag: String,
    pub rows: usize,
    pub cols: usize,
    /// Stored cells in row-major order, coefficients rendered as text
    pub entries: Vec<(usize, usize, String)>,
}

pub struct Session {
    config: SessionConfig,
    table: HandleTable,
    registry: &'static OperatorRegistry,
}

impl Session {
    /// Session over the process-wide registry
    pub fn new(config: SessionConfig) -> Self {
        Self::with_registry(config, OperatorRegistry::global())
    }

    pub fn with_registry(config: SessionConfig, registry: &'static OperatorRegistry) -> Self {
        let table = HandleTable::new(&config);
        Self {
            config,
            table,
            registry,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn table(&self) -> &HandleTable {
        &self.table
    }

    pub fn registry(&self) -> &'static OperatorRegistry {
        self.registry
    }

    /// Hand a native value to the host
    pub fn put<T: HostType>(&self, value: T) -> Result<HostHandle> {
        self.table.acquire(value)
    }

    pub fn call(&self, op: OperatorKind, args: &[HostHandle]) -> Result<HostHandle> {
        self.registry.dispatch(&self.table, op, args)
    }

    /// Like [`Session::call`], with the operator given by its host name
    pub fn call_named(&self, op: &str, args: &[HostHandle]) -> Result<HostHandle> {
        let kind = op.parse::<OperatorKind>().map_err(|op| HostError::UnknownOperator {
            op,
            signature: args.iter().map(|h| h.tag().to_string()).collect::<Vec<_>>().join(", "),
        })?;
        self.call(kind, args)
    }

    pub fn construct(
        &self,
        target: TypeTag,
        rows: i64,
        cols: i64,
        triples: &[Triple],
    ) -> Result<HostHandle> {
        self.registry.construct(&self.table, target, rows, cols, triples)
    }

    pub fn retain(&self, handle: HostHandle) -> Result<usize> {
        self.table.retain(handle)
    }

    pub fn release(&self, handle: HostHandle) -> Result<bool> {
        self.table.release(handle)
    }

    pub fn read_bool(&self, handle: HostHandle) -> Result<bool> {
        Ok(*self.table.resolve::<bool>(handle)?)
    }

    pub fn read_int(&self, handle: HostHandle) -> Result<i64> {
        Ok(*self.table.resolve::<i64>(handle)?)
    }

    pub fn read_integer(&self, handle: HostHandle) -> Result<BigInt> {
        Ok(self.table.resolve::<BigInt>(handle)?.as_ref().clone())
    }

    pub fn read_rational(&self, handle: HostHandle) -> Result<Rational> {
        Ok(self.table.resolve::<Rational>(handle)?.as_ref().clone())
    }

    pub fn export_matrix(&self, handle: HostHandle) -> Result<MatrixExport> {
        use CoefficientKind::{Integer, Rational as Q};
        use SymmetryKind::{NonSymmetric as N, Symmetric as S};

        match self.table.tag_of(handle)? {
            TypeTag::SparseMatrix(Q, N) => self.export::<Rational, NonSymmetric>(handle),
            TypeTag::SparseMatrix(Q, S) => self.export::<Rational, Symmetric>(handle),
            TypeTag::SparseMatrix(Integer, N) => self.export::<BigInt, NonSymmetric>(handle),
            TypeTag::SparseMatrix(Integer, S) => self.export::<BigInt, Symmetric>(handle),
            other => Err(HostError::mismatch(
                TypeTag::SparseMatrix(Q, N),
                other,
            )),
        }
    }

    fn export<C: HostCoefficient, S: Symmetry>(&self, handle: HostHandle) -> Result<MatrixExport> {
        let matrix = self.table.resolve::<SparseMatrix<C, S>>(handle)?;
        Ok(MatrixExport {
            tag: <SparseMatrix<C, S> as HostType>::TAG.to_string(),
            rows: matrix.rows(),
            cols: matrix.cols(),
            entries: matrix.entries().map(|(i, j, v)| (i, j, v.to_string())).collect(),
        })
    }

    /// Human-readable rendering of any handle's referent
    pub fn render(&self, handle: HostHandle) -> Result<String> {
        match self.table.tag_of(handle)? {
            TypeTag::Bool => Ok(self.read_bool(handle)?.to_string()),
            TypeTag::Int => Ok(self.read_int(handle)?.to_string()),
            TypeTag::Integer => Ok(self.read_integer(handle)?.to_string()),
            TypeTag::Rational => Ok(self.read_rational(handle)?.to_string()),
            TypeTag::SparseMatrix(..) => {
                let export = self.export_matrix(handle)?;
                let mut out = format!("{} {}x{}", export.tag, export.rows, export.cols);
                for (i, j, v) in &export.entries {
                    let _ = write!(out, " ({},{})={}", i, j, v);
                }
                Ok(out)
            }
        }
    }

    /// Live handles in this session
    pub fn live(&self) -> usize {
        self.table.live()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
