//! Command line: `check` type documents, `validate` instances against them.
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;

use raml_shapes::{BuildOptions, TypeDocument, TypeLibrary, Value};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// check RAML type documents and validate JSON instances against them
#[derive(Parser, Debug)]
#[command(name = "raml-shapes", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// resolve every type in the given documents and report the first error
    Check(CheckCmd),
    /// validate instance documents against one named type
    Validate(ValidateCmd),
}

#[derive(Args, Debug, Clone)]
struct BuildSettings {
    /// skip validating `example`, `examples`, `default` and custom facet values
    #[arg(long, default_value_t = false)]
    no_examples: bool,

    /// ignore facets that neither the type kind nor a parent declares
    #[arg(long, default_value_t = false)]
    allow_unknown_facets: bool,
}

#[derive(Args, Debug, Clone)]
struct CheckCmd {
    #[command(flatten)]
    build: BuildSettings,

    /// One or more type documents. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,

    /// print every resolved type name
    #[arg(long)]
    list: bool,
}

#[derive(Args, Debug, Clone)]
struct ValidateCmd {
    #[command(flatten)]
    build: BuildSettings,

    /// type documents (paths or quoted globs)
    #[arg(long, short = 't', num_args = 1.., required = true)]
    types: Vec<String>,

    /// name of the type instances must conform to
    #[arg(long = "type", short = 'n')]
    type_name: String,

    /// treat instance files as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer selecting the instance inside each document (e.g. /data/0)
    #[arg(long)]
    json_pointer: Option<String>,

    /// instance files (paths or quoted globs)
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl BuildSettings {
    fn options(&self) -> BuildOptions {
        BuildOptions { check_examples: !self.no_examples, allow_unknown_facets: self.allow_unknown_facets }
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Check(target) => {
                let library = load_library(&target.input, &target.build.options())?;
                if target.list {
                    for name in library.names() {
                        println!("{name}");
                    }
                }
                eprintln!("{} {} types", "ok".green().bold(), library.names().count());
                Ok(())
            }
            Command::Validate(target) => {
                let library = load_library(&target.types, &target.build.options())?;
                if library.lookup(&target.type_name).is_none() {
                    bail!("type `{}` is not declared", target.type_name);
                }
                let instances = target.load_instances()?;
                let results: Vec<Option<String>> = instances
                    .par_iter()
                    .map(|(_, value)| library.validate(&target.type_name, value).err().map(|e| e.to_string()))
                    .collect();
                let mut failed = 0;
                for ((label, _), result) in instances.iter().zip(&results) {
                    match result {
                        Some(error) => {
                            failed += 1;
                            println!("{} {label}: {error}", "✗".red().bold());
                        }
                        None => println!("{} {label}", "✓".green().bold()),
                    }
                }
                if failed > 0 {
                    bail!("{failed} of {} instances failed", instances.len());
                }
                Ok(())
            }
        }
    }
}

impl ValidateCmd {
    /// Every instance with a label naming where it came from.
    fn load_instances(&self) -> anyhow::Result<Vec<(Arc<str>, Value)>> {
        let mut out = Vec::new();
        for path in resolve_file_path_patterns(&self.input)? {
            let path_str = path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&path).with_context(|| format!("failed to read {path_str}"))?;
            let documents: Vec<(String, serde_json::Value)> = if self.ndjson {
                source
                    .lines()
                    .enumerate()
                    .filter(|(_, line)| !line.trim().is_empty())
                    .map(|(i, line)| {
                        serde_json::from_str::<serde_json::Value>(line)
                            .map(|v| (format!("{path_str}:{}", i + 1), v))
                            .with_context(|| format!("invalid JSON at {path_str}:{}", i + 1))
                    })
                    .collect::<anyhow::Result<_>>()?
            } else {
                let v = serde_json::from_str::<serde_json::Value>(&source).with_context(|| format!("invalid JSON in {path_str}"))?;
                vec![(path_str.clone(), v)]
            };
            for (label, document) in documents {
                let selected = match self.json_pointer.as_deref() {
                    Some(pointer) => document
                        .pointer(pointer)
                        .with_context(|| format!("{label}: nothing at JSON pointer {pointer}"))?,
                    None => &document,
                };
                out.push((Arc::from(label), Value::from(selected)));
            }
        }
        tracing::debug!(instances = out.len(), "instances loaded");
        Ok(out)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn load_library(patterns: &[String], options: &BuildOptions) -> anyhow::Result<TypeLibrary> {
    let paths = resolve_file_path_patterns(patterns)?;
    let mut merged = TypeDocument::default();
    let mut sources = Vec::with_capacity(paths.len());
    for path in &paths {
        let path_str = path.to_string_lossy().to_string();
        let src = std::fs::read_to_string(path).with_context(|| format!("failed to read type document {path_str}"))?;
        let document = TypeDocument::parse(&src, &path_str)?;
        tracing::debug!(source = %path_str, types = document.types.len(), "type document loaded");
        merged.merge(document, &path_str)?;
        sources.push(path_str);
    }
    let label = sources.join("+");
    let library = TypeLibrary::build(&merged.types(), &label, options)
        .with_context(|| format!("failed to resolve types from {label}"))?;
    Ok(library)
}

fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();
    for raw in patterns {
        let pattern = raw.as_ref();
        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern).with_context(|| format!("bad glob pattern: {pattern}"))? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                // an explicit glob that matched nothing is a mistake, not an empty input
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_paths_pass_through() {
        let paths = resolve_file_path_patterns(["a.json", "dir/b.json"]).unwrap();
        assert_eq!(paths, [PathBuf::from("a.json"), PathBuf::from("dir/b.json")]);
    }

    #[test]
    fn empty_glob_is_an_error() {
        assert!(resolve_file_path_patterns(["/definitely/not/here/*.json"]).is_err());
    }

    #[test]
    fn arguments_parse() {
        let cli = CommandLineInterface::try_parse_from([
            "raml-shapes", "validate", "-t", "types.json", "--type", "Person", "-i", "a.json", "b.json", "--ndjson",
        ])
        .unwrap();
        match cli.cmd {
            Command::Validate(v) => {
                assert_eq!(v.type_name, "Person");
                assert_eq!(v.input, ["a.json", "b.json"]);
                assert!(v.ndjson);
                assert!(v.build.options().check_examples);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
