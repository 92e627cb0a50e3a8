//! Configuration for an ingestion run
//!
//! Defaults reproduce the fixed layout of the batch job: three CSV files in
//! `./data` and the SQLite store next to it. Environment variables and CLI
//! flags may override the two locations.

use crate::error::{IngestError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_DATABASE_PATH: &str = "./shipment_database.db";

/// Self-contained shipments
pub const DEFAULT_DIRECT_SOURCE: &str = "shipping_data_0.csv";
/// Shipment identifier + product, one row per unit
pub const DEFAULT_DETAIL_SOURCE: &str = "shipping_data_1.csv";
/// Shipment identifier + origin/destination
pub const DEFAULT_LOCATION_SOURCE: &str = "shipping_data_2.csv";

pub const DATA_DIR_ENV: &str = "SHIPMENT_DATA_DIR";
pub const DATABASE_ENV: &str = "SHIPMENT_DATABASE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Directory holding the three source files
    pub data_dir: PathBuf,

    /// SQLite database file
    pub database_path: PathBuf,

    pub direct_source: String,
    pub detail_source: String,
    pub location_source: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            direct_source: DEFAULT_DIRECT_SOURCE.to_string(),
            detail_source: DEFAULT_DETAIL_SOURCE.to_string(),
            location_source: DEFAULT_LOCATION_SOURCE.to_string(),
        }
    }
}

impl IngestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::new();

        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            config.set_data_dir(dir)?;
        }

        if let Ok(db) = std::env::var(DATABASE_ENV) {
            config.set_database_path(db)?;
        }

        Ok(config)
    }

    pub fn set_data_dir(&mut self, dir: impl Into<PathBuf>) -> Result<()> {
        self.data_dir = non_empty(dir.into(), "data directory")?;
        Ok(())
    }

    pub fn set_database_path(&mut self, path: impl Into<PathBuf>) -> Result<()> {
        self.database_path = non_empty(path.into(), "database path")?;
        Ok(())
    }

    /// Resolve the source file names against the data directory
    pub fn source_paths(&self) -> SourcePaths {
        SourcePaths {
            direct: self.data_dir.join(&self.direct_source),
            detail: self.data_dir.join(&self.detail_source),
            location: self.data_dir.join(&self.location_source),
        }
    }

    /// File name of the store, for the confirmation line
    pub fn database_name(&self) -> String {
        self.database_path
            .file_name()
            .unwrap_or(self.database_path.as_os_str())
            .to_string_lossy()
            .into_owned()
    }
}

fn non_empty(path: PathBuf, what: &str) -> Result<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(IngestError::config(format!("{what} must not be empty")));
    }
    Ok(path)
}

/// Fully resolved locations of the three input files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePaths {
    pub direct: PathBuf,
    pub detail: PathBuf,
    pub location: PathBuf,
}

impl SourcePaths {
    pub fn all(&self) -> [&Path; 3] {
        [&self.direct, &self.detail, &self.location]
    }

    /// Fail with the first missing file, before anything touches the store
    pub fn ensure_exist(&self) -> Result<()> {
        match self.all().into_iter().find(|p| !p.is_file()) {
            Some(missing) => Err(IngestError::SourceNotFound(missing.to_path_buf())),
            None => Ok(()),
        }
    }
}
