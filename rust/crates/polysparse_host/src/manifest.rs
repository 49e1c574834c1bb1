//! Instantiation manifest: which operator signatures get concrete routines
//!
//! Shared with the build script, which turns a parsed manifest into the
//! generated instantiation units. Grammar, one declaration per line:
//!
//! ```text
//! # comment
//! max.instances=40
//! Binary_mul(Int, SparseMatrix<Rational, NonSymmetric>)
//! new SparseMatrix<Rational, Symmetric>
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::tag::TypeTag;

/// Cap on routines per instantiation unit when the manifest does not set one
pub const DEFAULT_MAX_INSTANCES: usize = 40;

/// Environment variable overriding the manifest's `max.instances`
pub const MAX_INSTANCES_ENV: &str = "POLYSPARSE_MAX_INSTANCES";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OperatorKind {
    BinaryMul,
    BinaryAdd,
    BinarySub,
    BinaryDiv,
    BinaryEq,
    UnaryNeg,
    Transpose,
    Element,
}

impl OperatorKind {
    pub const ALL: [OperatorKind; 8] = [
        Self::BinaryMul,
        Self::BinaryAdd,
        Self::BinarySub,
        Self::BinaryDiv,
        Self::BinaryEq,
        Self::UnaryNeg,
        Self::Transpose,
        Self::Element,
    ];

    /// Host-facing operator name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BinaryMul => "Binary_mul",
            Self::BinaryAdd => "Binary_add",
            Self::BinarySub => "Binary_sub",
            Self::BinaryDiv => "Binary_div",
            Self::BinaryEq => "Binary__eq",
            Self::UnaryNeg => "Unary_neg",
            Self::Transpose => "Transpose",
            Self::Element => "Element",
        }
    }

    /// Lowercase stem used for unit and binding names
    pub fn stem(self) -> &'static str {
        match self {
            Self::BinaryMul => "binary_mul",
            Self::BinaryAdd => "binary_add",
            Self::BinarySub => "binary_sub",
            Self::BinaryDiv => "binary_div",
            Self::BinaryEq => "binary_eq",
            Self::UnaryNeg => "unary_neg",
            Self::Transpose => "transpose",
            Self::Element => "element",
        }
    }

    pub fn arity(self) -> usize {
        match self {
            Self::UnaryNeg | Self::Transpose => 1,
            Self::Element => 3,
            _ => 2,
        }
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperatorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// One manifest line
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Declaration {
    Operator { kind: OperatorKind, operands: Vec<TypeTag> },
    Constructor { target: TypeTag },
}

impl Declaration {
    /// Unit family this declaration is grouped into
    pub fn group(&self) -> &'static str {
        match self {
            Self::Operator { kind, .. } => kind.stem(),
            Self::Constructor { .. } => "new",
        }
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Operator { kind, operands } => {
                write!(f, "{}(", kind)?;
                for (i, tag) in operands.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", tag)?;
                }
                f.write_str(")")
            }
            Self::Constructor { target } => write!(f, "new {}", target),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("instances.manifest:{line}: {message}")]
pub struct ManifestError {
    pub line: usize,
    pub message: String,
}

impl ManifestError {
    fn at(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub max_instances: usize,
    pub declarations: Vec<Declaration>,
}

impl Manifest {
    pub fn parse(text: &str) -> Result<Self, ManifestError> {
        let mut max_instances = DEFAULT_MAX_INSTANCES;
        let mut declarations = Vec::new();

        for (index, raw) in text.lines().enumerate() {
            let line_no = index + 1;
            let line = raw.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }

            if let Some(value) = line.strip_prefix("max.instances") {
                let value = value
                    .trim_start()
                    .strip_prefix('=')
                    .ok_or_else(|| ManifestError::at(line_no, "expected `max.instances=N`"))?;
                max_instances = parse_cap(value.trim())
                    .ok_or_else(|| {
                        ManifestError::at(line_no, format!("invalid cap {:?}", value.trim()))
                    })?;
                continue;
            }

            if let Some(target) = line.strip_prefix("new ") {
                let target: TypeTag = target
                    .parse()
                    .map_err(|e| ManifestError::at(line_no, format!("{}", e)))?;
                if !target.is_matrix() {
                    return Err(ManifestError::at(line_no, format!("cannot construct {}", target)));
                }
                declarations.push(Declaration::Constructor { target });
                continue;
            }

            declarations.push(parse_operator(line).map_err(|m| ManifestError::at(line_no, m))?);
        }

        Ok(Self {
            max_instances,
            declarations,
        })
    }

    /// Declarations with duplicates dropped, first occurrence kept
    pub fn unique_declarations(&self) -> Vec<Declaration> {
        let mut seen = BTreeSet::new();
        self.declarations
            .iter()
            .filter(|d| seen.insert((*d).clone()))
            .cloned()
            .collect()
    }
}

/// Parse a positive cap; zero is rejected
pub fn parse_cap(value: &str) -> Option<usize> {
    value.parse::<usize>().ok().filter(|&n| n > 0)
}

fn parse_operator(line: &str) -> Result<Declaration, String> {
    let open = line.find('(').ok_or_else(|| format!("expected `Op(Type, ...)`, got {:?}", line))?;
    let args = line[open + 1..]
        .strip_suffix(')')
        .ok_or_else(|| format!("unterminated operand list in {:?}", line))?;
    let name = line[..open].trim();
    let kind: OperatorKind = name.parse().map_err(|n| format!("unknown operator {:?}", n))?;

    let operands = split_operands(args)
        .into_iter()
        .map(|s| s.parse::<TypeTag>().map_err(|e| e.to_string()))
        .collect::<Result<Vec<_>, _>>()?;
    if operands.len() != kind.arity() {
        return Err(format!(
            "{} takes {} operand(s), {} given",
            kind,
            kind.arity(),
            operands.len()
        ));
    }
    if kind == OperatorKind::Element
        && (!operands[0].is_matrix() || operands[1..] != [TypeTag::Int, TypeTag::Int])
    {
        return Err("Element takes (SparseMatrix<..>, Int, Int)".to_string());
    }
    Ok(Declaration::Operator { kind, operands })
}

/// Split on commas that are not nested inside `<...>`
fn split_operands(args: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, ch) in args.char_indices() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(args[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    let last = args[start..].trim();
    if !last.is_empty() || !parts.is_empty() {
        parts.push(last);
    }
    parts
}

/// One compilation unit's worth of declarations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitPlan {
    pub name: String,
    pub declarations: Vec<Declaration>,
}

/// Group declarations per operator family, then chunk each family so no
/// unit holds more than `cap` routines.
pub fn plan_units(declarations: &[Declaration], cap: usize) -> Vec<UnitPlan> {
    let cap = cap.max(1);
    let mut seen = BTreeSet::new();
    let mut groups: BTreeMap<&'static str, Vec<Declaration>> = BTreeMap::new();
    for decl in declarations {
        if seen.insert(decl.clone()) {
            groups.entry(decl.group()).or_default().push(decl.clone());
        }
    }

    groups
        .into_iter()
        .flat_map(|(group, decls)| {
            decls
                .chunks(cap)
                .enumerate()
                .map(|(k, chunk)| UnitPlan {
                    name: format!("{}_{}", group, k),
                    declarations: chunk.to_vec(),
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::CoefficientKind;
    use polysparse_core::SymmetryKind;

    const RATIONAL_NS: TypeTag =
        TypeTag::SparseMatrix(CoefficientKind::Rational, SymmetryKind::NonSymmetric);

    #[test]
    fn test_parse_declarations() {
        let m = Manifest::parse(
            "# header\n\
             max.instances = 3\n\
             Binary_mul(Int, SparseMatrix<Rational, NonSymmetric>)  # scale\n\
             \n\
             Unary_neg(SparseMatrix<Rational>)\n\
             new SparseMatrix<Rational, NonSymmetric>\n",
        )
        .unwrap();
        assert_eq!(m.max_instances, 3);
        assert_eq!(
            m.declarations,
            vec![
                Declaration::Operator {
                    kind: OperatorKind::BinaryMul,
                    operands: vec![TypeTag::Int, RATIONAL_NS],
                },
                Declaration::Operator {
                    kind: OperatorKind::UnaryNeg,
                    operands: vec![RATIONAL_NS],
                },
                Declaration::Constructor { target: RATIONAL_NS },
            ]
        );
        assert_eq!(
            m.declarations[0].to_string(),
            "Binary_mul(Int, SparseMatrix<Rational, NonSymmetric>)"
        );
    }

    #[test]
    fn test_default_cap() {
        let m = Manifest::parse("Transpose(SparseMatrix<Integer, Symmetric>)").unwrap();
        assert_eq!(m.max_instances, DEFAULT_MAX_INSTANCES);
    }

    #[test]
    fn test_malformed_lines_report_their_line() {
        let err = Manifest::parse("\nBinary_pow(Int, Int)").unwrap_err();
        assert_eq!(err.line, 2);

        let err = Manifest::parse("Binary_mul(Int)").unwrap_err();
        assert!(err.message.contains("takes 2"));

        assert!(Manifest::parse("max.instances=0").is_err());
        assert!(Manifest::parse("new Rational").is_err());
        assert!(Manifest::parse("Binary_add(Int, Float)").is_err());
        assert!(Manifest::parse("Binary_add(Int, Int").is_err());
        assert!(Manifest::parse("Element(SparseMatrix<Rational>, Rational, Int)").is_err());
        assert!(Manifest::parse("Element(SparseMatrix<Rational>, Int, Int)").is_ok());
    }

    #[test]
    fn test_units_respect_cap_and_dedupe() {
        let scalars = [TypeTag::Int, TypeTag::Integer, TypeTag::Rational, TypeTag::Int];
        let decls: Vec<Declaration> = scalars
            .into_iter()
            .map(|scalar| Declaration::Operator {
                kind: OperatorKind::BinaryMul,
                operands: vec![scalar, RATIONAL_NS],
            })
            .chain(std::iter::once(Declaration::Constructor { target: RATIONAL_NS }))
            .collect();

        let units = plan_units(&decls, 2);
        let names: Vec<&str> = units.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["binary_mul_0", "binary_mul_1", "new_0"]);
        assert!(units.iter().all(|u| u.declarations.len() <= 2));
        let total: usize = units.iter().map(|u| u.declarations.len()).sum();
        assert_eq!(total, 4);
    }

    #[test]
    fn test_operator_names_round_trip() {
        for kind in OperatorKind::ALL {
            assert_eq!(kind.as_str().parse::<OperatorKind>(), Ok(kind));
        }
        assert!("Binary_pow".parse::<OperatorKind>().is_err());
    }
}
