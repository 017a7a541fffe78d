//! MangaDex export CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use mangadex::MangadexClient;
use md_export::exporter::records_by_status;
use md_export::{ExportStore, Exporter};
use shared::{Config, LogConfig};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "Export a MangaDex library to JSON", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::from_file(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Initialize logging
    shared::logging::init(LogConfig::from_settings(
        "md-export",
        &config.logging,
        args.verbose,
    )?)?;

    info!("MangaDex export starting");
    info!(config_file = %args.config.display(), "Loaded configuration");

    let store = ExportStore::open(config.export_path())
        .context("Failed to open export file")?;

    let client = MangadexClient::connect(&config)
        .await
        .context("Failed to authenticate with MangaDex")?;

    let mut exporter = Exporter::new(client, store);
    let report = exporter.run().await.context("Export failed")?;

    info!("=== Export Complete ===");
    info!("Status buckets: {}", report.buckets);
    info!("Records written this run: {}", report.records_written);
    info!("Records in export file: {}", report.total_records);
    for (status, count) in records_by_status(exporter.store().records()) {
        info!("  {}: {}", status, count);
    }
    for warning in &report.warnings {
        warn!("{}", warning);
    }

    Ok(())
}
