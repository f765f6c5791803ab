//! Runs the JSON fixture cases under `cases/`.
//!
//! Each case is a type document plus instances with their expected outcome,
//! or the error category the document itself must fail with.
//!
//! ```text
//! cargo run -p dev-test-runner -- [name-regex]
//! ```
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use colored::Colorize;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use raml_shapes::{BuildOptions, TypeLibrary, Value, document::from_str_with_path};

static CASES_DIR: Lazy<PathBuf> = Lazy::new(|| Path::new(env!("CARGO_MANIFEST_DIR")).join("cases"));

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Case {
    #[serde(default)]
    description: String,
    types: IndexMap<String, serde_json::Value>,
    /// Error category the document must fail to resolve with.
    #[serde(default)]
    expect_error: Option<String>,
    #[serde(default)]
    instances: Vec<Instance>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Instance {
    #[serde(rename = "type")]
    type_name: String,
    value: serde_json::Value,
    valid: bool,
}

fn run_case(path: &Path) -> anyhow::Result<Vec<String>> {
    let src = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let case: Case = from_str_with_path(&src, &path.to_string_lossy())?;
    tracing::debug!(case = %path.display(), description = %case.description, "running");
    let types: IndexMap<String, Value> = case.types.iter().map(|(k, v)| (k.clone(), Value::from(v))).collect();

    let mut problems = Vec::new();
    let library = match (TypeLibrary::build(&types, "case", &BuildOptions::default()), &case.expect_error) {
        (Ok(_), Some(expected)) => {
            problems.push(format!("resolved, expected a {expected} error"));
            return Ok(problems);
        }
        (Err(error), Some(expected)) => {
            if error.category() != expected {
                problems.push(format!("expected a {expected} error, got: {error}"));
            }
            return Ok(problems);
        }
        (Err(error), None) => {
            problems.push(format!("failed to resolve: {error}"));
            return Ok(problems);
        }
        (Ok(library), None) => library,
    };

    for (i, instance) in case.instances.iter().enumerate() {
        let outcome = library.validate(&instance.type_name, &Value::from(&instance.value));
        match (outcome, instance.valid) {
            (Ok(()), true) | (Err(_), false) => {}
            (Ok(()), false) => problems.push(format!("instance {i} ({}) accepted, expected rejection", instance.type_name)),
            (Err(error), true) => problems.push(format!("instance {i} ({}) rejected: {error}", instance.type_name)),
        }
    }
    Ok(problems)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let filter = std::env::args()
        .nth(1)
        .map(|p| Regex::new(&p).with_context(|| format!("bad case filter: {p}")))
        .transpose()?;

    let mut paths: Vec<PathBuf> = std::fs::read_dir(&*CASES_DIR)
        .with_context(|| format!("failed to list {}", CASES_DIR.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let mut failed = 0;
    let mut ran = 0;
    for path in &paths {
        let name = path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
        if filter.as_ref().is_some_and(|rx| !rx.is_match(&name)) {
            continue;
        }
        ran += 1;
        let problems = run_case(path)?;
        if problems.is_empty() {
            println!("{} {name}", "✓".green().bold());
        } else {
            failed += 1;
            println!("{} {name}", "✗".red().bold());
            for problem in problems {
                println!("    {problem}");
            }
        }
    }
    if failed > 0 {
        bail!("{failed} of {ran} cases failed");
    }
    println!("{ran} cases passed");
    Ok(())
}
