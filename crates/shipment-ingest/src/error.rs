//! Error types for shipment ingestion
//!
//! Every variant is fatal for the run: the driver stops at the first error and
//! the open transaction is rolled back when it goes out of scope.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for ingestion operations
pub type Result<T> = std::result::Result<T, IngestError>;

#[derive(Error, Debug)]
pub enum IngestError {
    /// Required input file is missing
    #[error("Source file not found: '{}'. Check the data directory and file names.", .0.display())]
    SourceNotFound(PathBuf),

    /// `product_quantity` could not be coerced to a non-negative integer
    #[error("Malformed quantity '{value}' in {} at line {line}", .source_path.display())]
    MalformedQuantity {
        source_path: PathBuf,
        line: u64,
        value: String,
    },

    /// Source is not valid CSV or lacks a required column
    #[error("Failed to read {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Header row lacks a column the loader reads
    #[error("Missing column '{column}' in {}", .path.display())]
    MissingColumn { path: PathBuf, column: &'static str },

    /// Database could not be opened, written or committed
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] rusqlite::Error),

    /// Any other file-system failure
    #[error("File operation failed: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration is missing or invalid
    #[error("Configuration error: {0}")]
    Config(String),
}

impl IngestError {
    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
