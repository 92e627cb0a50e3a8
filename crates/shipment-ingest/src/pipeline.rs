//! Ingestion driver
//!
//! Runs the direct loader, then the join-aggregate loader, through one
//! [`IngestContext`] and commits once at the end. Any error drops the
//! context before commit, so a failed run leaves the store as it was.

use crate::config::IngestConfig;
use crate::error::Result;
use crate::loaders::{load_direct, load_joined};
use crate::models::IngestReport;
use crate::schema::{init_schema, verify_schema};
use crate::source::CsvSource;
use crate::storage::{open_database, IngestContext};
use rusqlite::Connection;
use tracing::info;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Create missing tables (and the database file) before loading
    pub init_schema: bool,
    /// Load everything, then roll back instead of committing
    pub dry_run: bool,
}

pub struct IngestPipeline {
    config: IngestConfig,
    options: RunOptions,
}

impl IngestPipeline {
    pub fn new(config: IngestConfig) -> Self {
        Self {
            config,
            options: RunOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Full run: check sources, open the store, load, commit.
    ///
    /// Missing sources are reported before the database is opened.
    pub fn run(&self) -> Result<IngestReport> {
        self.config.source_paths().ensure_exist()?;

        let mut conn = open_database(&self.config.database_path, self.options.init_schema)?;
        if self.options.init_schema {
            init_schema(&conn)?;
        }
        verify_schema(&conn)?;

        self.ingest(&mut conn)
    }

    /// Load both sources into an already open store
    pub fn ingest(&self, conn: &mut Connection) -> Result<IngestReport> {
        let paths = self.config.source_paths();

        let mut direct = CsvSource::open(&paths.direct)?;
        let mut locations = CsvSource::open(&paths.location)?;
        let mut details = CsvSource::open(&paths.detail)?;

        let mut ctx = IngestContext::begin(conn)?;

        let direct_stats = load_direct(&mut direct, &mut ctx)?;
        let join_stats = load_joined(&mut locations, &mut details, &mut ctx)?;

        let mut report = IngestReport {
            products_created: ctx.products().created(),
            direct_shipments: direct_stats.shipments_inserted,
            joined_shipments: join_stats.shipments_inserted,
            orphaned_groups: join_stats.orphaned_groups,
            overwritten_locations: join_stats.overwritten_locations,
            committed: false,
        };

        if self.options.dry_run {
            ctx.rollback()?;
        } else {
            ctx.commit()?;
            report.committed = true;
        }

        info!(
            products_created = report.products_created,
            direct_shipments = report.direct_shipments,
            joined_shipments = report.joined_shipments,
            orphaned_groups = report.orphaned_groups,
            committed = report.committed,
            "Ingestion finished"
        );
        Ok(report)
    }
}
