//! MangaDex rating statistics CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use mangadex::MangadexClient;
use md_stats::collect_ratings;
use shared::{Config, LogConfig};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Rating statistics for a MangaDex library", long_about = None)]
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
        "md-stats",
        &config.logging,
        args.verbose,
    )?)?;

    info!("MangaDex stats starting");

    let mut client = MangadexClient::connect(&config)
        .await
        .context("Failed to authenticate with MangaDex")?;

    let report = collect_ratings(&mut client)
        .await
        .context("Failed to collect ratings")?;

    println!("{report}");

    info!(
        buckets = report.buckets.len(),
        ratings = report.all_ratings().len(),
        "MangaDex stats finished"
    );

    Ok(())
}
