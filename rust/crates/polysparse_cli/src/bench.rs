//! Dispatch benchmark over random sparse matrices

use anyhow::{bail, Context, Result};
use polysparse_core::Rational;
use polysparse_host::{HostHandle, OperatorKind, Session, SessionConfig, Triple, TypeTag};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Debug, Clone)]
struct BenchResult {
    size: usize,
    nnz: usize,
    construct_ms: f64,
    add_ms: f64,
    mul_ms: f64,
    product_nnz: usize,
}

fn parse_sizes(sizes: &str) -> Result<Vec<usize>> {
    sizes
        .split(',')
        .map(|s| s.trim().parse::<usize>().with_context(|| format!("invalid size {:?}", s)))
        .collect()
}

/// Random `n x n` matrix with roughly `density * n * n` small rational entries
fn random_matrix(
    session: &Session,
    rng: &mut StdRng,
    n: usize,
    density: f64,
) -> Result<(HostHandle, usize)> {
    let target: TypeTag = "SparseMatrix<Rational, NonSymmetric>".parse()?;
    let count = ((n * n) as f64 * density).round() as usize;
    let mut triples = Vec::with_capacity(count);
    let handle = put_entries(session, rng, n, count, &mut triples)
        .and_then(|()| Ok(session.construct(target, n as i64, n as i64, &triples)?));
    for (_, _, value) in triples {
        session.release(value)?;
    }
    let handle = handle?;
    let nnz = session.export_matrix(handle)?.entries.len();
    Ok((handle, nnz))
}

fn put_entries(
    session: &Session,
    rng: &mut StdRng,
    n: usize,
    count: usize,
    triples: &mut Vec<Triple>,
) -> Result<()> {
    for _ in 0..count {
        let value = Rational::from_pair(rng.gen_range(-9..=9), rng.gen_range(1..=4))?;
        let i = rng.gen_range(0..n) as i64;
        let j = rng.gen_range(0..n) as i64;
        triples.push((i, j, session.put(value)?));
    }
    Ok(())
}

fn run_single(session: &Session, rng: &mut StdRng, n: usize, density: f64) -> Result<BenchResult> {
    let start = Instant::now();
    let (a, nnz) = random_matrix(session, rng, n, density)?;
    let (b, _) = random_matrix(session, rng, n, density)?;
    let construct_ms = start.elapsed().as_secs_f64() * 1000.0 / 2.0;

    let start = Instant::now();
    let sum = session.call(OperatorKind::BinaryAdd, &[a, b])?;
    let add_ms = start.elapsed().as_secs_f64() * 1000.0;

    let start = Instant::now();
    let product = session.call(OperatorKind::BinaryMul, &[a, b])?;
    let mul_ms = start.elapsed().as_secs_f64() * 1000.0;
    let product_nnz = session.export_matrix(product)?.entries.len();

    for h in [a, b, sum, product] {
        session.release(h)?;
    }

    Ok(BenchResult {
        size: n,
        nnz,
        construct_ms,
        add_ms,
        mul_ms,
        product_nnz,
    })
}

pub fn run_bench(
    config: SessionConfig,
    sizes: &str,
    density: f64,
    seed: u64,
    export: Option<PathBuf>,
) -> Result<()> {
    if !(0.0..=1.0).contains(&density) {
        bail!("density must be within [0, 1], got {}", density);
    }
    let sizes = parse_sizes(sizes)?;

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║              Polysparse - Dispatch Benchmark                 ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
    println!("Density: {}", density);
    println!("Seed:    {}", seed);
    println!();

    let session = Session::new(config);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut results = Vec::new();

    println!("┌─────────┬──────────┬────────────┬────────────┬────────────┬────────────┐");
    println!("│  Size   │   nnz    │  Build(ms) │   Add(ms)  │   Mul(ms)  │  Prod nnz  │");
    println!("├─────────┼──────────┼────────────┼────────────┼────────────┼────────────┤");

    for &n in &sizes {
        let r = run_single(&session, &mut rng, n, density)?;
        println!(
            "│ {:>7} │ {:>8} │ {:>10.3} │ {:>10.3} │ {:>10.3} │ {:>10} │",
            r.size, r.nnz, r.construct_ms, r.add_ms, r.mul_ms, r.product_nnz
        );
        results.push(r);
    }

    println!("└─────────┴──────────┴────────────┴────────────┴────────────┴────────────┘");
    tracing::debug!(live = session.live(), "benchmark finished");

    if let Some(path) = export {
        export_results(&path, &results)?;
        println!("\nResults exported to: {}", path.display());
    }
    Ok(())
}

fn export_results(path: &PathBuf, results: &[BenchResult]) -> Result<()> {
    let mut file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    writeln!(file, "size,nnz,construct_ms,add_ms,mul_ms,product_nnz")?;
    for r in results {
        writeln!(
            file,
            "{},{},{:.6},{:.6},{:.6},{}",
            r.size, r.nnz, r.construct_ms, r.add_ms, r.mul_ms, r.product_nnz
        )?;
    }
    Ok(())
}
