//! Shipment Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Cross-cutting utilities shared by the shipment workspace members.
//!
//! # Overview
//!
//! - **Logging**: `tracing` subscriber setup driven by [`logging::LogConfig`]
//!
//! # Example
//!
//! ```no_run
//! use shipment_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_logging(&LogConfig::from_env()?)?;
//!     Ok(())
//! }
//! ```

pub mod logging;

pub use logging::{init_logging, LogConfig, LogFormat, LogLevel, LogOutput, LoggingGuard};
