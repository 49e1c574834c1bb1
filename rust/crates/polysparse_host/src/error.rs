//! Error types for the host layer

use polysparse_core::AlgebraError;
use thiserror::Error;

use crate::handle::HandleId;
use crate::manifest::OperatorKind;
use crate::tag::TypeTag;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: TypeTag, found: TypeTag },

    #[error("{op} takes {expected} operand(s), got {found}")]
    Arity {
        op: OperatorKind,
        expected: usize,
        found: usize,
    },

    #[error("no routine for {op}({signature})")]
    UnknownOperator { op: String, signature: String },

    #[error("negative index or dimension {0}")]
    NegativeIndex(i64),

    #[error("stale handle #{0}")]
    StaleHandle(HandleId),

    #[error("handle limit reached ({0} live handles)")]
    HandleLimit(usize),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Algebra(#[from] AlgebraError),
}

/// Coarse classification reported to hosts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    TypeMismatch,
    ShapeMismatch,
    IndexOutOfBounds,
    DivisionByZero,
    UnknownOperator,
    StaleHandle,
    HandleLimit,
    Config,
    Parse,
}

impl HostError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TypeMismatch { .. } | Self::Arity { .. } => ErrorKind::TypeMismatch,
            Self::UnknownOperator { .. } => ErrorKind::UnknownOperator,
            Self::NegativeIndex(_) => ErrorKind::IndexOutOfBounds,
            Self::StaleHandle(_) => ErrorKind::StaleHandle,
            Self::HandleLimit(_) => ErrorKind::HandleLimit,
            Self::Config(_) => ErrorKind::Config,
            Self::Algebra(e) => match e {
                AlgebraError::ShapeMismatch { .. } | AlgebraError::NotSquare { .. } => {
                    ErrorKind::ShapeMismatch
                }
                AlgebraError::IndexOutOfBounds { .. } => ErrorKind::IndexOutOfBounds,
                AlgebraError::DivisionByZero => ErrorKind::DivisionByZero,
                AlgebraError::Parse(_) => ErrorKind::Parse,
            },
        }
    }

    pub(crate) fn mismatch(expected: TypeTag, found: TypeTag) -> Self {
        Self::TypeMismatch { expected, found }
    }
}

pub type Result<T> = std::result::Result<T, HostError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(
            HostError::from(AlgebraError::DivisionByZero).kind(),
            ErrorKind::DivisionByZero
        );
        assert_eq!(
            HostError::from(AlgebraError::NotSquare { rows: 2, cols: 3 }).kind(),
            ErrorKind::ShapeMismatch
        );
        assert_eq!(
            HostError::Arity {
                op: OperatorKind::UnaryNeg,
                expected: 1,
                found: 2
            }
            .kind(),
            ErrorKind::TypeMismatch
        );
        assert_eq!(HostError::NegativeIndex(-1).kind(), ErrorKind::IndexOutOfBounds);
    }
}
