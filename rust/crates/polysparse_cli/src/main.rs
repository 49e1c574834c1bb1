//! Polysparse CLI
//!
//! A stand-in host for the polysparse operator registry.
//!
//! # Usage
//! ```bash
//! # Evaluate a JSON operation script
//! polysparse eval script.json
//!
//! # List generated routines by instantiation unit
//! polysparse routines
//!
//! # Run the built-in scenarios and compare against a manifest
//! polysparse check --manifest rust/crates/polysparse_host/instances.manifest
//!
//! # Time random sparse products and sums through dispatch
//! polysparse bench --sizes 16,64,256 --density 0.05
//! ```

mod bench;
mod check;
mod script;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use polysparse_host::{OperatorRegistry, SessionConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "polysparse")]
#[command(about = "Exact sparse matrix algebra behind a dynamically typed operator registry")]
#[command(version)]
struct Cli {
    /// Session configuration (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a JSON operation script
    Eval {
        /// Path to the script
        script: PathBuf,
    },

    /// List registered routines grouped by instantiation unit
    Routines,

    /// Run the built-in scenarios through the registry
    Check {
        /// Also report declarations of this manifest missing from the registry
        #[arg(long)]
        manifest: Option<PathBuf>,
    },

    /// Benchmark random sparse products and sums through dispatch
    Bench {
        /// Square matrix sizes (comma-separated)
        #[arg(long, default_value = "16,64,128")]
        sizes: String,

        /// Fraction of cells that are nonzero
        #[arg(long, default_value = "0.05")]
        density: f64,

        /// RNG seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Export results to CSV
        #[arg(long)]
        export: Option<PathBuf>,
    },
}

/// `RUST_LOG` directives when present and valid, `info` otherwise
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn main() -> Result<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(rust_log.as_deref()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Eval { script } => script::run_script(&script, config),
        Commands::Routines => {
            print_routines();
            Ok(())
        }
        Commands::Check { manifest } => check::run_check(config, manifest.as_ref()),
        Commands::Bench {
            sizes,
            density,
            seed,
            export,
        } => bench::run_bench(config, &sizes, density, seed, export),
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<SessionConfig> {
    let config = match path {
        Some(path) => SessionConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SessionConfig::default(),
    };
    Ok(config.with_env()?)
}

fn print_routines() {
    let registry = OperatorRegistry::global();
    let declarations = registry.declarations();

    for unit in registry.units() {
        println!("{} ({} routines)", unit.name, unit.routines);
        for (declaration, _) in declarations.iter().filter(|(_, u)| *u == unit.name) {
            println!("    {}", declaration);
        }
    }
    println!();
    println!(
        "{} routines in {} units",
        registry.len(),
        registry.units().len()
    );
}
