use super::CliError;
use anyhow::Context;
use globset::{Glob, GlobMatcher};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use xas_core::XasError;
use xas_core::common::config::{ProcessingConfig, ProcessingConfigError, load_processing_config};

pub(super) const DEFAULT_INPUT_PATTERN: &str = "*.{dat,yaml}";

/// Log to stderr; `RUST_LOG` wins over the `-v` count.
pub(super) fn init_tracing(verbosity: u8) {
    let fallback = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub(super) fn load_config(path: Option<&Path>) -> Result<ProcessingConfig, CliError> {
    let Some(path) = path else {
        return Ok(ProcessingConfig::default());
    };
    load_processing_config(path).map_err(|error| {
        let mapped = match &error {
            ProcessingConfigError::Read { .. } => {
                XasError::io_system("IO.CONFIG_READ", error.to_string())
            }
            ProcessingConfigError::Parse { .. } => {
                XasError::input_validation("INPUT.CONFIG_PARSE", error.to_string())
            }
        };
        CliError::Compute(mapped)
    })
}

/// Files are taken as given; directories contribute their matching entries
/// in name order.
pub(super) fn resolve_inputs(inputs: &[PathBuf], pattern: &str) -> Result<Vec<PathBuf>, CliError> {
    let matcher = input_matcher(pattern)?;
    let mut resolved = Vec::new();

    for input in inputs {
        if input.is_dir() {
            let mut matched = directory_matches(input, &matcher)?;
            debug!(
                directory = %input.display(),
                files = matched.len(),
                "expanded input directory"
            );
            resolved.append(&mut matched);
        } else {
            resolved.push(input.clone());
        }
    }

    if resolved.is_empty() {
        return Err(CliError::Compute(XasError::input_validation(
            "INPUT.NO_FILES",
            format!("no input files matched pattern '{pattern}'"),
        )));
    }
    Ok(resolved)
}

fn input_matcher(pattern: &str) -> Result<GlobMatcher, CliError> {
    Glob::new(pattern)
        .map(|glob| glob.compile_matcher())
        .map_err(|error| CliError::Usage(format!("invalid input pattern '{pattern}': {error}")))
}

fn directory_matches(directory: &Path, matcher: &GlobMatcher) -> Result<Vec<PathBuf>, CliError> {
    let entries = fs::read_dir(directory)
        .with_context(|| format!("failed to list input directory '{}'", directory.display()))?;

    let mut matched = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("failed to read an entry of '{}'", directory.display()))?
            .path();
        let name_matches = path
            .file_name()
            .is_some_and(|name| matcher.is_match(Path::new(name)));
        if path.is_file() && name_matches {
            matched.push(path);
        }
    }
    matched.sort();
    Ok(matched)
}

pub(super) fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let rendered =
        serde_json::to_string_pretty(value).context("failed to serialize command output")?;
    println!("{rendered}");
    Ok(())
}
