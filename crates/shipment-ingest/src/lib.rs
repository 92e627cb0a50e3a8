//! Shipment Ingest Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! One-shot batch load of shipment CSV sources into a SQLite store.
//!
//! # Sources
//!
//! - **Direct** (`shipping_data_0.csv`): each row is a complete shipment
//! - **Detail** (`shipping_data_1.csv`): one row per unit of a product on a
//!   shipment, keyed by `shipment_identifier`
//! - **Location** (`shipping_data_2.csv`): origin and destination per
//!   `shipment_identifier`
//!
//! Detail and location rows are joined by identifier and aggregated into one
//! shipment per (identifier, product). The identifier itself is not stored.
//! Products are resolved by exact name and shared across both loaders.
//!
//! # Example
//!
//! ```no_run
//! use shipment_ingest::{IngestConfig, IngestPipeline};
//!
//! fn main() -> shipment_ingest::Result<()> {
//!     let report = IngestPipeline::new(IngestConfig::from_env()?).run()?;
//!     println!("{} shipments ingested", report.total_shipments());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod loaders;
pub mod models;
pub mod pipeline;
pub mod product;
pub mod schema;
pub mod source;
pub mod storage;

// Re-export commonly used types
pub use config::{IngestConfig, SourcePaths};
pub use error::{IngestError, Result};
pub use models::{IngestReport, NewShipment, ProductId};
pub use pipeline::{IngestPipeline, RunOptions};
pub use product::ProductResolver;
pub use storage::{IngestContext, ShipmentStore};
