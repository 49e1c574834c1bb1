//! Built-in scenario self-check
//!
//! Runs the reference scenarios end to end through the registry, the way a
//! host would, and compares against known results.

use anyhow::{bail, ensure, Context, Result};
use polysparse_core::Rational;
use polysparse_host::{
    ErrorKind, HostHandle, Manifest, OperatorKind, OperatorRegistry, Session, SessionConfig,
    TypeTag,
};
use std::path::PathBuf;

const MATRIX: &str = "SparseMatrix<Rational, NonSymmetric>";

struct Scenario {
    name: &'static str,
    run: fn(&Session) -> Result<()>,
}

const SCENARIOS: &[Scenario] = &[
    Scenario {
        name: "scale 2x2 by Int 4",
        run: scale_by_int,
    },
    Scenario {
        name: "cancelling sum is empty",
        run: cancelling_sum,
    },
    Scenario {
        name: "1x2 times 2x1",
        run: row_times_column,
    },
    Scenario {
        name: "duplicate triples sum",
        run: duplicate_triples,
    },
    Scenario {
        name: "2x2 + 3x3 is ShapeMismatch",
        run: shape_mismatch,
    },
    Scenario {
        name: "5 / 0 is DivisionByZero",
        run: division_by_zero,
    },
];

fn q(text: &str) -> Result<Rational> {
    Ok(text.parse::<Rational>()?)
}

fn matrix(
    session: &Session,
    rows: i64,
    cols: i64,
    cells: &[(i64, i64, &str)],
) -> Result<HostHandle> {
    let target: TypeTag = MATRIX.parse()?;
    let mut triples = Vec::new();
    for &(i, j, v) in cells {
        triples.push((i, j, session.put(q(v)?)?));
    }
    Ok(session.construct(target, rows, cols, &triples)?)
}

fn expect_entries(
    session: &Session,
    h: HostHandle,
    shape: (usize, usize),
    expected: &[(usize, usize, &str)],
) -> Result<()> {
    let export = session.export_matrix(h)?;
    ensure!(
        (export.rows, export.cols) == shape,
        "shape {}x{}, expected {}x{}",
        export.rows,
        export.cols,
        shape.0,
        shape.1
    );
    let expected: Vec<(usize, usize, String)> = expected
        .iter()
        .map(|&(i, j, v)| (i, j, v.to_string()))
        .collect();
    ensure!(export.entries == expected, "entries {:?}, expected {:?}", export.entries, expected);
    Ok(())
}

fn expect_error(result: polysparse_host::Result<HostHandle>, kind: ErrorKind) -> Result<()> {
    match result {
        Ok(_) => bail!("expected {:?}, call succeeded", kind),
        Err(e) if e.kind() == kind => Ok(()),
        Err(e) => bail!("expected {:?}, got {:?} ({})", kind, e.kind(), e),
    }
}

fn scale_by_int(session: &Session) -> Result<()> {
    let a = matrix(session, 2, 2, &[(0, 0, "1/2"), (1, 1, "3")])?;
    let four = session.put(4i64)?;
    let out = session.call(OperatorKind::BinaryMul, &[four, a])?;
    expect_entries(session, out, (2, 2), &[(0, 0, "2"), (1, 1, "12")])
}

fn cancelling_sum(session: &Session) -> Result<()> {
    let a = matrix(session, 2, 2, &[(0, 1, "1")])?;
    let b = matrix(session, 2, 2, &[(0, 1, "-1")])?;
    let out = session.call(OperatorKind::BinaryAdd, &[a, b])?;
    expect_entries(session, out, (2, 2), &[])
}

fn row_times_column(session: &Session) -> Result<()> {
    let a = matrix(session, 1, 2, &[(0, 0, "1"), (0, 1, "2")])?;
    let b = matrix(session, 2, 1, &[(0, 0, "3"), (1, 0, "4")])?;
    let out = session.call(OperatorKind::BinaryMul, &[a, b])?;
    expect_entries(session, out, (1, 1), &[(0, 0, "11")])
}

fn duplicate_triples(session: &Session) -> Result<()> {
    let m = matrix(session, 2, 2, &[(0, 0, "1"), (0, 0, "2")])?;
    expect_entries(session, m, (2, 2), &[(0, 0, "3")])
}

fn shape_mismatch(session: &Session) -> Result<()> {
    let a = matrix(session, 2, 2, &[])?;
    let b = matrix(session, 3, 3, &[])?;
    expect_error(session.call(OperatorKind::BinaryAdd, &[a, b]), ErrorKind::ShapeMismatch)
}

fn division_by_zero(session: &Session) -> Result<()> {
    let five = session.put(q("5")?)?;
    let zero = session.put(q("0")?)?;
    expect_error(session.call(OperatorKind::BinaryDiv, &[five, zero]), ErrorKind::DivisionByZero)
}

pub fn run_check(config: SessionConfig, manifest: Option<&PathBuf>) -> Result<()> {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                 Polysparse - Scenario Check                  ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    let mut failed = 0;
    for scenario in SCENARIOS {
        // fresh session per scenario so handle limits and leaks stay local
        let session = Session::new(config.clone());
        match (scenario.run)(&session) {
            Ok(()) => println!("  PASS  {}", scenario.name),
            Err(e) => {
                failed += 1;
                println!("  FAIL  {}: {:#}", scenario.name, e);
            }
        }
    }

    if let Some(path) = manifest {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let manifest = Manifest::parse(&text)?;
        let missing = OperatorRegistry::global().missing(&manifest);
        println!();
        println!(
            "Manifest {}: {} declarations, {} missing",
            path.display(),
            manifest.unique_declarations().len(),
            missing.len()
        );
        for declaration in &missing {
            println!("  MISSING  {}", declaration);
        }
        failed += missing.len();
    }

    println!();
    if failed > 0 {
        bail!("{} check(s) failed", failed);
    }
    println!("All {} scenarios passed", SCENARIOS.len());
    Ok(())
}
