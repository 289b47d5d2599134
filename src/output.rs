//! CSV output of ownership results.

use crate::domain::OwnershipResult;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

pub const CSV_HEADER: [&str; 3] = ["address", "owns_nft", "error"];

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to open {0}: {1}")]
    Open(String, std::io::Error),
    #[error("csv write error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Destination for results, consumed by a single task.
pub trait ResultSink {
    fn write(&mut self, result: &OwnershipResult) -> Result<(), OutputError>;
}

impl ResultSink for Vec<OwnershipResult> {
    fn write(&mut self, result: &OwnershipResult) -> Result<(), OutputError> {
        self.push(result.clone());
        Ok(())
    }
}

/// Appends one CSV row per result, flushing after each row.
#[derive(Debug)]
pub struct ResultWriter<W: Write> {
    writer: csv::Writer<W>,
    rows: usize,
}

impl ResultWriter<File> {
    /// Create (or truncate) `path` and write the header row.
    pub fn create(path: &Path) -> Result<Self, OutputError> {
        if path.exists() {
            warn!("Overwriting existing file: {}", path.display());
        }
        let file =
            File::create(path).map_err(|e| OutputError::Open(path.display().to_string(), e))?;
        Self::from_writer(file)
    }
}

impl<W: Write> ResultWriter<W> {
    pub fn from_writer(inner: W) -> Result<Self, OutputError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(inner);
        writer.write_record(CSV_HEADER)?;
        writer.flush()?;
        Ok(Self { writer, rows: 0 })
    }

    /// Number of data rows written.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flush buffered output and return the underlying writer.
    pub fn finish(mut self) -> Result<W, OutputError> {
        self.writer.flush()?;
        self.writer
            .into_inner()
            .map_err(|e| OutputError::Io(std::io::Error::new(e.error().kind(), e.error().to_string())))
    }
}

impl<W: Write> ResultSink for ResultWriter<W> {
    fn write(&mut self, result: &OwnershipResult) -> Result<(), OutputError> {
        self.writer.serialize(result)?;
        self.writer.flush()?;
        self.rows += 1;
        Ok(())
    }
}
