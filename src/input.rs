//! Reading newline-delimited address lists.

use std::collections::HashSet;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Source of address entries, one per line.
#[derive(Debug, Clone)]
pub struct AddressSource {
    path: PathBuf,
}

impl AddressSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all trimmed, non-empty lines in file order.
    ///
    /// Entries are not validated here; malformed addresses surface later as
    /// per-row errors.
    pub fn load(&self) -> Result<Vec<String>, InputError> {
        let file = std::fs::File::open(&self.path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => InputError::FileNotFound(self.path.clone()),
            _ => InputError::Read {
                path: self.path.clone(),
                source: e,
            },
        })?;

        let mut entries = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|e| InputError::Read {
                path: self.path.clone(),
                source: e,
            })?;
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                entries.push(trimmed.to_string());
            }
        }

        Ok(entries)
    }
}

/// Drop repeated entries, keeping the first occurrence of each.
///
/// Comparison ignores ASCII case so checksummed and lowercase spellings of the
/// same address collapse together.
pub fn dedup(entries: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|e| seen.insert(e.to_ascii_lowercase()))
        .collect()
}
