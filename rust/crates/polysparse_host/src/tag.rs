//! Type descriptors for values crossing the host boundary
//!
//! Also compiled into the build script, so this file may only depend on
//! `polysparse_core`, `thiserror` and std.

use polysparse_core::SymmetryKind;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CoefficientKind {
    Integer,
    Rational,
}

impl CoefficientKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "Integer",
            Self::Rational => "Rational",
        }
    }
}

/// Dynamic type of a handle's referent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeTag {
    Bool,
    Int,
    Integer,
    Rational,
    SparseMatrix(CoefficientKind, SymmetryKind),
}

impl TypeTag {
    pub fn is_matrix(self) -> bool {
        matches!(self, Self::SparseMatrix(..))
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("Bool"),
            Self::Int => f.write_str("Int"),
            Self::Integer => f.write_str("Integer"),
            Self::Rational => f.write_str("Rational"),
            Self::SparseMatrix(c, s) => write!(f, "SparseMatrix<{}, {}>", c.as_str(), s.as_str()),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown type {0:?}")]
pub struct TagParseError(pub String);

impl FromStr for TypeTag {
    type Err = TagParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "Bool" => return Ok(Self::Bool),
            "Int" => return Ok(Self::Int),
            "Integer" => return Ok(Self::Integer),
            "Rational" => return Ok(Self::Rational),
            _ => {}
        }
        let params = s
            .strip_prefix("SparseMatrix")
            .map(str::trim_start)
            .and_then(|rest| rest.strip_prefix('<'))
            .and_then(|rest| rest.strip_suffix('>'))
            .ok_or_else(|| TagParseError(s.to_string()))?;

        let mut parts = params.split(',').map(str::trim);
        let coefficient = match parts.next() {
            Some("Integer") => CoefficientKind::Integer,
            Some("Rational") => CoefficientKind::Rational,
            _ => return Err(TagParseError(s.to_string())),
        };
        // a bare `SparseMatrix<C>` is non-symmetric
        let symmetry = match parts.next() {
            None | Some("NonSymmetric") => SymmetryKind::NonSymmetric,
            Some("Symmetric") => SymmetryKind::Symmetric,
            Some(_) => return Err(TagParseError(s.to_string())),
        };
        if parts.next().is_some() {
            return Err(TagParseError(s.to_string()));
        }
        Ok(Self::SparseMatrix(coefficient, symmetry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_parses_back() {
        let tags = [
            TypeTag::Bool,
            TypeTag::Int,
            TypeTag::Integer,
            TypeTag::Rational,
            TypeTag::SparseMatrix(CoefficientKind::Rational, SymmetryKind::NonSymmetric),
            TypeTag::SparseMatrix(CoefficientKind::Integer, SymmetryKind::Symmetric),
        ];
        for tag in tags {
            assert_eq!(tag.to_string().parse::<TypeTag>().unwrap(), tag);
        }
    }

    #[test]
    fn test_lenient_spacing_and_default_symmetry() {
        assert_eq!(
            "SparseMatrix <Rational>".parse::<TypeTag>().unwrap(),
            TypeTag::SparseMatrix(CoefficientKind::Rational, SymmetryKind::NonSymmetric)
        );
        assert_eq!(
            " SparseMatrix<Integer,Symmetric> ".parse::<TypeTag>().unwrap(),
            TypeTag::SparseMatrix(CoefficientKind::Integer, SymmetryKind::Symmetric)
        );
    }

    #[test]
    fn test_rejects_unknown_types() {
        assert!("Float".parse::<TypeTag>().is_err());
        assert!("SparseMatrix<Float, Symmetric>".parse::<TypeTag>().is_err());
        assert!("SparseMatrix<Rational, Symmetric, X>".parse::<TypeTag>().is_err());
    }
}
