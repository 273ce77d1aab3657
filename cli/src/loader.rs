//! Config file loading
//!
//! Loads SLO configs and error budget policies from YAML files, resolving
//! `${VAR}` environment-variable placeholders in the raw content before
//! parsing. A directory of configs is discovered by scanning for
//! `slo_*.yaml` files, sorted for deterministic evaluation order.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::de::DeserializeOwned;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Result, SloctlError};

/// Parse a YAML file after environment-variable substitution
pub fn parse_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    debug!(path = %path.display(), "loading config");
    let content = fs::read_to_string(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => SloctlError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => SloctlError::Io(err),
    })?;
    let content = substitute_env_vars(&content)?;
    Ok(serde_yaml::from_str(&content)?)
}

/// Replace `${VAR}` placeholders with environment variable values.
///
/// A referenced variable that is not set is an error, not an empty string.
pub fn substitute_env_vars(content: &str) -> Result<String> {
    let pattern = Regex::new(r"\$\{(\w+)\}").expect("valid placeholder pattern");

    let mut result = String::with_capacity(content.len());
    let mut last_end = 0;
    for capture in pattern.captures_iter(content) {
        let whole = capture.get(0).expect("capture 0 always present");
        let name = &capture[1];
        let value = env::var(name).map_err(|_| SloctlError::MissingEnvVar {
            name: name.to_string(),
        })?;
        result.push_str(&content[last_end..whole.start()]);
        result.push_str(&value);
        last_end = whole.end();
    }
    result.push_str(&content[last_end..]);
    Ok(result)
}

/// Resolve the SLO config paths for a file or directory argument.
///
/// A file argument is used as-is; a directory is scanned for `slo_*.yaml`
/// (or `.yml`) files. Paths come back sorted so batch evaluation order is
/// stable across runs.
pub fn discover_configs(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    if !path.is_dir() {
        return Err(SloctlError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let mut paths: Vec<PathBuf> = WalkDir::new(path)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            let name = entry.file_name().to_string_lossy();
            name.starts_with("slo_") && (name.ends_with(".yaml") || name.ends_with(".yml"))
        })
        .map(|entry| entry.into_path())
        .collect();
    paths.sort();

    if paths.is_empty() {
        return Err(SloctlError::NoConfigsFound {
            path: path.display().to_string(),
        });
    }

    Ok(paths)
}
