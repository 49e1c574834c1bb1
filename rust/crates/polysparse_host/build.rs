//! Build script for operator instantiation
//!
//! Reads `instances.manifest`, splits the declared signatures into units of
//! at most `max.instances` routines each, and writes one Rust source file per
//! unit plus an index listing every unit's `register` function.

use std::env;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

#[allow(dead_code)]
#[path = "src/tag.rs"]
mod tag;

#[allow(dead_code)]
#[path = "src/manifest.rs"]
mod manifest;

use manifest::{plan_units, Declaration, Manifest, OperatorKind, UnitPlan, MAX_INSTANCES_ENV};
use tag::{CoefficientKind, TypeTag};

fn main() {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let manifest_path = manifest_dir.join("instances.manifest");
    println!("cargo:rerun-if-changed={}", manifest_path.display());
    println!("cargo:rerun-if-changed=src/manifest.rs");
    println!("cargo:rerun-if-changed=src/tag.rs");
    println!("cargo:rerun-if-env-changed={}", MAX_INSTANCES_ENV);

    let text = fs::read_to_string(&manifest_path)
        .unwrap_or_else(|e| panic!("cannot read {}: {}", manifest_path.display(), e));
    let manifest = Manifest::parse(&text).unwrap_or_else(|e| panic!("{}", e));

    let cap = match env::var(MAX_INSTANCES_ENV) {
        Ok(value) => manifest::parse_cap(value.trim()).unwrap_or_else(|| {
            panic!("{}={:?} must be a positive integer", MAX_INSTANCES_ENV, value)
        }),
        Err(_) => manifest.max_instances,
    };

    let units = plan_units(&manifest.declarations, cap);

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let unit_dir = out_dir.join("instances");
    // stale units from a previous cap must not linger
    let _ = fs::remove_dir_all(&unit_dir);
    fs::create_dir_all(&unit_dir).expect("Failed to create instances directory");

    for unit in &units {
        write_file(&unit_dir.join(format!("{}.rs", unit.name)), &render_unit(unit));
    }
    write_file(&out_dir.join("instances.rs"), &render_index(&units));
}

fn write_file(path: &Path, contents: &str) {
    fs::write(path, contents).unwrap_or_else(|e| panic!("cannot write {}: {}", path.display(), e));
}

fn coefficient_type(kind: CoefficientKind) -> &'static str {
    match kind {
        CoefficientKind::Integer => "::num_bigint::BigInt",
        CoefficientKind::Rational => "::polysparse_core::Rational",
    }
}

fn rust_type(tag: TypeTag) -> String {
    match tag {
        TypeTag::Bool => "bool".to_string(),
        TypeTag::Int => "i64".to_string(),
        TypeTag::Integer => coefficient_type(CoefficientKind::Integer).to_string(),
        TypeTag::Rational => coefficient_type(CoefficientKind::Rational).to_string(),
        TypeTag::SparseMatrix(c, s) => format!(
            "::polysparse_core::SparseMatrix<{}, ::polysparse_core::{}>",
            coefficient_type(c),
            s.as_str()
        ),
    }
}

/// Generic parameters of the binding for `kind`: `Element` is generic over
/// the matrix only, every other operator over all of its operands.
fn binding_params(kind: OperatorKind, operands: &[TypeTag]) -> String {
    let generic = match kind {
        OperatorKind::Element => &operands[..1],
        _ => operands,
    };
    generic.iter().map(|&t| rust_type(t)).collect::<Vec<_>>().join(", ")
}

fn render_unit(unit: &UnitPlan) -> String {
    let mut out = String::new();
    writeln!(out, "// Generated from instances.manifest by build.rs. Do not edit.").unwrap();
    writeln!(out, "// unit {}: {} routine(s)", unit.name, unit.declarations.len()).unwrap();
    writeln!(out).unwrap();
    let constructors = unit
        .declarations
        .iter()
        .any(|d| matches!(d, Declaration::Constructor { .. }));
    if constructors {
        writeln!(out, "use crate::construct::Triple;").unwrap();
    } else {
        writeln!(out, "use crate::manifest::OperatorKind;").unwrap();
    }
    writeln!(out, "use crate::error::Result;").unwrap();
    writeln!(out, "use crate::handle::{{HandleTable, HostHandle}};").unwrap();
    writeln!(out, "use crate::registry::RegistryBuilder;").unwrap();
    writeln!(out, "use crate::value::HostType;").unwrap();

    let mut registrations = String::new();
    for (i, decl) in unit.declarations.iter().enumerate() {
        writeln!(out).unwrap();
        writeln!(out, "// {}", decl).unwrap();
        match decl {
            Declaration::Operator { kind, operands } => {
                writeln!(
                    out,
                    "fn routine_{i}(table: &HandleTable, args: &[HostHandle]) \
                     -> Result<HostHandle> {{\n    \
                     crate::bind::{}::<{}>(table, args)\n}}",
                    kind.stem(),
                    binding_params(*kind, operands),
                )
                .unwrap();
                let tags = operands
                    .iter()
                    .map(|&t| format!("<{} as HostType>::TAG", rust_type(t)))
                    .collect::<Vec<_>>()
                    .join(", ");
                writeln!(
                    registrations,
                    "    registry.operator(OperatorKind::{:?}, &[{}], routine_{i});",
                    kind, tags
                )
                .unwrap();
            }
            Declaration::Constructor { target } => {
                let TypeTag::SparseMatrix(c, s) = *target else {
                    panic!("cannot construct {}", target);
                };
                writeln!(
                    out,
                    "fn routine_{i}(table: &HandleTable, rows: i64, cols: i64, triples: &[Triple]) \
                     -> Result<HostHandle> {{\n    \
                     crate::construct::new_sparse_matrix::<{}, ::polysparse_core::{}>\
                     (table, rows, cols, triples)\n}}",
                    coefficient_type(c),
                    s.as_str(),
                )
                .unwrap();
                writeln!(
                    registrations,
                    "    registry.constructor(<{} as HostType>::TAG, routine_{i});",
                    rust_type(*target)
                )
                .unwrap();
            }
        }
    }

    writeln!(out).unwrap();
    writeln!(out, "pub(crate) fn register(registry: &mut RegistryBuilder) {{").unwrap();
    out.push_str(&registrations);
    writeln!(out, "}}").unwrap();
    out
}

fn render_index(units: &[UnitPlan]) -> String {
    let mut out = String::new();
    writeln!(out, "// Generated from instances.manifest by build.rs. Do not edit.").unwrap();
    for unit in units {
        writeln!(
            out,
            "pub(crate) mod {name} {{\n    \
             include!(concat!(env!(\"OUT_DIR\"), \"/instances/{name}.rs\"));\n}}",
            name = unit.name
        )
        .unwrap();
    }
    writeln!(out).unwrap();
    writeln!(out, "/// Every generated unit, in manifest family order").unwrap();
    writeln!(out, "pub(crate) const UNITS: &[crate::registry::Unit] = &[").unwrap();
    for unit in units {
        writeln!(
            out,
            "    crate::registry::Unit {{ name: {:?}, register: {}::register }},",
            unit.name, unit.name
        )
        .unwrap();
    }
    writeln!(out, "];").unwrap();
    out
}
