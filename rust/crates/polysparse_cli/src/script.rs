//! JSON operation scripts
//!
//! ```json
//! {
//!   "values": {
//!     "a": { "matrix": { "coefficient": "Rational", "rows": 2, "cols": 2,
//!                        "entries": [[0, 0, "1/2"], [1, 1, "3"]] } },
//!     "k": { "int": 4 }
//!   },
//!   "ops": [
//!     { "op": "Binary_mul", "args": ["k", "a"], "bind": "b" },
//!     { "release": "a" }
//!   ]
//! }
//! ```

use anyhow::{anyhow, bail, Context, Result};
use num_bigint::BigInt;
use polysparse_core::Rational;
use polysparse_host::{CoefficientKind, HostHandle, Session, SessionConfig, Triple, TypeTag};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub values: BTreeMap<String, ValueSpec>,
    #[serde(default)]
    pub ops: Vec<Step>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueSpec {
    Bool(bool),
    Int(i64),
    Integer(String),
    Rational(Rational),
    Matrix(MatrixSpec),
}

#[derive(Debug, Deserialize)]
pub struct MatrixSpec {
    pub coefficient: String,
    #[serde(default = "default_symmetry")]
    pub symmetry: String,
    pub rows: i64,
    pub cols: i64,
    #[serde(default)]
    pub entries: Vec<(i64, i64, String)>,
}

fn default_symmetry() -> String {
    "NonSymmetric".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Step {
    Call {
        op: String,
        args: Vec<String>,
        bind: Option<String>,
    },
    Release {
        release: String,
    },
}

/// Bindings from script names to live handles
pub struct Env<'s> {
    session: &'s Session,
    names: HashMap<String, HostHandle>,
}

impl<'s> Env<'s> {
    pub fn new(session: &'s Session) -> Self {
        Self {
            session,
            names: HashMap::new(),
        }
    }

    fn lookup(&self, name: &str) -> Result<HostHandle> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| anyhow!("unbound name {:?}", name))
    }

    /// Rebinding a name releases the handle it held
    fn bind(&mut self, name: String, handle: HostHandle) -> Result<()> {
        if let Some(old) = self.names.insert(name, handle) {
            self.session.release(old)?;
        }
        Ok(())
    }

    pub fn define(&mut self, name: &str, spec: &ValueSpec) -> Result<HostHandle> {
        let handle = match spec {
            ValueSpec::Bool(b) => self.session.put(*b)?,
            ValueSpec::Int(n) => self.session.put(*n)?,
            ValueSpec::Integer(text) => self.session.put(parse_integer(text)?)?,
            ValueSpec::Rational(q) => self.session.put(q.clone())?,
            ValueSpec::Matrix(m) => self
                .build_matrix(m)
                .with_context(|| format!("building {:?}", name))?,
        };
        self.bind(name.to_string(), handle)?;
        Ok(handle)
    }

    fn build_matrix(&self, spec: &MatrixSpec) -> Result<HostHandle> {
        let target: TypeTag =
            format!("SparseMatrix<{}, {}>", spec.coefficient, spec.symmetry).parse()?;
        let TypeTag::SparseMatrix(coefficient, _) = target else {
            bail!("{} is not a matrix type", target);
        };

        let mut triples = Vec::with_capacity(spec.entries.len());
        let result = self
            .put_entries(spec, coefficient, &mut triples)
            .and_then(|()| Ok(self.session.construct(target, spec.rows, spec.cols, &triples)?));

        // the entry values were only needed for construction
        for (_, _, value) in triples {
            self.session.release(value)?;
        }
        result
    }

    fn put_entries(
        &self,
        spec: &MatrixSpec,
        coefficient: CoefficientKind,
        triples: &mut Vec<Triple>,
    ) -> Result<()> {
        for (row, col, text) in &spec.entries {
            let value = match coefficient {
                CoefficientKind::Rational => self.session.put(text.parse::<Rational>()?)?,
                CoefficientKind::Integer => self.session.put(parse_integer(text)?)?,
            };
            triples.push((*row, *col, value));
        }
        Ok(())
    }

    /// Run one step; returns the printed line
    pub fn step(&mut self, step: &Step) -> Result<String> {
        match step {
            Step::Call { op, args, bind } => {
                let handles = args.iter().map(|a| self.lookup(a)).collect::<Result<Vec<_>>>()?;
                let result = self.session.call_named(op, &handles)?;
                let rendered = self.session.render(result)?;
                let label = match bind {
                    Some(name) => {
                        self.bind(name.clone(), result)?;
                        name.clone()
                    }
                    None => {
                        self.session.release(result)?;
                        format!("{}({})", op, args.join(", "))
                    }
                };
                Ok(format!("{} = {}", label, rendered))
            }
            Step::Release { release } => {
                let handle = self
                    .names
                    .remove(release)
                    .ok_or_else(|| anyhow!("unbound name {:?}", release))?;
                self.session.release(handle)?;
                Ok(format!("released {}", release))
            }
        }
    }
}

fn parse_integer(text: &str) -> Result<BigInt> {
    text.trim()
        .parse::<BigInt>()
        .with_context(|| format!("invalid integer {:?}", text))
}

pub fn run_script(path: &Path, config: SessionConfig) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let script: Script = serde_json::from_str(&text)
        .with_context(|| format!("parsing {}", path.display()))?;

    let session = Session::new(config);
    let mut env = Env::new(&session);
    for (name, spec) in &script.values {
        env.define(name, spec)?;
    }

    let mut failures = 0;
    for (i, step) in script.ops.iter().enumerate() {
        match env.step(step) {
            Ok(line) => println!("{}", line),
            Err(e) => {
                failures += 1;
                match e.downcast_ref::<polysparse_host::HostError>() {
                    Some(host) => println!("step {}: {:?} error: {}", i, host.kind(), host),
                    None => println!("step {}: error: {:#}", i, e),
                }
            }
        }
    }

    tracing::info!(steps = script.ops.len(), failures, live = session.live(), "script finished");
    if failures > 0 {
        bail!("{} of {} steps failed", failures, script.ops.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = r#"{
        "values": {
            "a": { "matrix": { "coefficient": "Rational", "rows": 2, "cols": 2,
                               "entries": [[0, 0, "1/2"], [1, 1, "3"]] } },
            "k": { "int": 4 }
        },
        "ops": [
            { "op": "Binary_mul", "args": ["k", "a"], "bind": "b" },
            { "op": "Transpose", "args": ["b"] },
            { "release": "a" },
            { "op": "Binary_add", "args": ["a", "b"] }
        ]
    }"#;

    #[test]
    fn test_script_runs_through_registry() {
        let script: Script = serde_json::from_str(SCRIPT).unwrap();
        let session = Session::default();
        let mut env = Env::new(&session);
        for (name, spec) in &script.values {
            env.define(name, spec).unwrap();
        }
        // a matrix and k; entry values were released after construction
        assert_eq!(session.live(), 2);

        assert_eq!(
            env.step(&script.ops[0]).unwrap(),
            "b = SparseMatrix<Rational, NonSymmetric> 2x2 (0,0)=2 (1,1)=12"
        );
        assert!(env.step(&script.ops[1]).unwrap().starts_with("Transpose(b) = "));
        assert_eq!(env.step(&script.ops[2]).unwrap(), "released a");
        assert!(env.step(&script.ops[3]).is_err());
        assert_eq!(session.live(), 2);
    }

    #[test]
    fn test_bad_coefficient_spelling() {
        let session = Session::default();
        let mut env = Env::new(&session);
        let spec = ValueSpec::Matrix(MatrixSpec {
            coefficient: "Float".to_string(),
            symmetry: default_symmetry(),
            rows: 1,
            cols: 1,
            entries: vec![],
        });
        assert!(env.define("m", &spec).is_err());
    }

    #[test]
    fn test_failed_matrix_entries_are_released() {
        let session = Session::default();
        let mut env = Env::new(&session);
        let spec = ValueSpec::Matrix(MatrixSpec {
            coefficient: "Rational".to_string(),
            symmetry: default_symmetry(),
            rows: 2,
            cols: 2,
            entries: vec![(0, 0, "1/2".to_string()), (1, 1, "x".to_string())],
        });
        assert!(env.define("m", &spec).is_err());
        assert_eq!(session.live(), 0);
    }

    #[test]
    fn test_handle_limit_mid_matrix_releases_entries() {
        let session = Session::new(SessionConfig {
            handle_limit: Some(2),
            ..SessionConfig::default()
        });
        let mut env = Env::new(&session);
        let spec = ValueSpec::Matrix(MatrixSpec {
            coefficient: "Integer".to_string(),
            symmetry: default_symmetry(),
            rows: 3,
            cols: 3,
            entries: vec![
                (0, 0, "1".to_string()),
                (1, 1, "2".to_string()),
                (2, 2, "3".to_string()),
            ],
        });
        assert!(env.define("m", &spec).is_err());
        assert_eq!(session.live(), 0);
    }
}
