//! Shipment Ingest - load shipment CSV sources into the shipment database

use clap::Parser;
use shipment_common::logging::{init_logging, LogConfig, LogLevel, LoggingGuard};
use shipment_ingest::{IngestConfig, IngestPipeline, RunOptions};
use std::path::PathBuf;
use std::process;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "shipment-ingest")]
#[command(author, version, about = "Load shipment CSV sources into the shipment database")]
struct Cli {
    /// Directory containing shipping_data_{0,1,2}.csv [env: SHIPMENT_DATA_DIR]
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// SQLite database file [env: SHIPMENT_DATABASE]
    #[arg(long)]
    database: Option<PathBuf>,

    /// Create the product and shipment tables if they are missing
    #[arg(long)]
    init_schema: bool,

    /// Load everything, then roll back instead of committing
    #[arg(long)]
    dry_run: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let log_guard = init_tracing(cli.verbose);

    match run(&cli) {
        Ok(line) => println!("{line}"),
        Err(e) => {
            debug!(error = ?e, "Ingestion failed");
            eprintln!("Error: {e}");
            // Flush file logs; exit skips destructors
            drop(log_guard);
            process::exit(1);
        },
    }
}

/// Warn by default, debug with `--verbose`; `LOG_*` variables override both.
///
/// Invalid `LOG_*` settings are reported and ignored. Ingestion still runs if
/// no subscriber can be installed at all.
fn init_tracing(verbose: bool) -> Option<LoggingGuard> {
    let level = if verbose { LogLevel::Debug } else { LogLevel::Warn };
    let base = LogConfig::builder()
        .level(level)
        .log_file_prefix("shipment-ingest")
        .build();

    match init_with_env(base.clone()) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: ignoring logging environment: {e:#}");
            init_logging(&base).ok()
        },
    }
}

fn init_with_env(config: LogConfig) -> anyhow::Result<LoggingGuard> {
    init_logging(&config.merge_env()?)
}

/// Run the ingestion and build the confirmation line
fn run(cli: &Cli) -> shipment_ingest::Result<String> {
    // Flags take precedence over SHIPMENT_DATA_DIR / SHIPMENT_DATABASE
    let mut config = IngestConfig::from_env()?;
    if let Some(ref dir) = cli.data_dir {
        config.set_data_dir(dir)?;
    }
    if let Some(ref db) = cli.database {
        config.set_database_path(db)?;
    }

    let pipeline = IngestPipeline::new(config).with_options(RunOptions {
        init_schema: cli.init_schema,
        dry_run: cli.dry_run,
    });
    let report = pipeline.run()?;
    let database = pipeline.config().database_name();

    Ok(if report.committed {
        format!("All data ingested into {database}")
    } else {
        format!(
            "Dry run complete: {} shipments would be ingested into {database}",
            report.total_shipments()
        )
    })
}
