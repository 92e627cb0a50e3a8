//! Tabular source readers
//!
//! A [`CsvSource`] wraps a `csv::Reader` with the path it came from, so every
//! error names its file. Rows are typed through [`SourceRecord`], which also
//! declares the header columns that must be present before any row is read.

use crate::error::{IngestError, Result};
use crate::models::{DirectShipmentRow, ShipmentLocationRow, ShipmentProductRow};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A row type read from a CSV source by header name
pub trait SourceRecord: DeserializeOwned {
    /// Columns that must appear in the header row
    const COLUMNS: &'static [&'static str];
}

impl SourceRecord for DirectShipmentRow {
    const COLUMNS: &'static [&'static str] =
        &["origin_warehouse", "destination_store", "product", "product_quantity"];
}

impl SourceRecord for ShipmentProductRow {
    const COLUMNS: &'static [&'static str] = &["shipment_identifier", "product"];
}

impl SourceRecord for ShipmentLocationRow {
    const COLUMNS: &'static [&'static str] =
        &["shipment_identifier", "origin_warehouse", "destination_store"];
}

/// A deserialized row with its 1-based line number in the file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRow<T> {
    pub line: u64,
    pub record: T,
}

pub struct CsvSource<R> {
    path: PathBuf,
    reader: csv::Reader<R>,
}

impl CsvSource<File> {
    /// Open a source file; a missing file is [`IngestError::SourceNotFound`]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => IngestError::SourceNotFound(path.to_path_buf()),
            _ => IngestError::Io(e),
        })?;

        debug!(path = %path.display(), "Opened source");
        Ok(Self::from_reader(path, file))
    }
}

impl<R: Read> CsvSource<R> {
    /// Wrap any reader; `path` is only used to label errors
    pub fn from_reader(path: impl Into<PathBuf>, reader: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        Self {
            path: path.into(),
            reader,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Iterate typed rows in file order.
    ///
    /// The header row is checked against `T::COLUMNS` first; extra columns
    /// are ignored.
    pub fn rows<T: SourceRecord>(
        &mut self,
    ) -> Result<impl Iterator<Item = Result<SourceRow<T>>> + '_> {
        let headers = self
            .reader
            .headers()
            .map_err(|e| IngestError::csv(&self.path, e))?
            .clone();

        if let Some(&column) = T::COLUMNS.iter().find(|c| !headers.iter().any(|h| h == **c)) {
            return Err(IngestError::MissingColumn {
                path: self.path.clone(),
                column,
            });
        }

        let path = &self.path;
        Ok(self.reader.records().map(move |record| {
            let record = record.map_err(|e| IngestError::csv(path, e))?;
            let line = record.position().map_or(0, |p| p.line());
            let record = record
                .deserialize(Some(&headers))
                .map_err(|e| IngestError::csv(path, e))?;
            Ok(SourceRow { line, record })
        }))
    }
}
