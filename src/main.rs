//! Attraction Harvester main entry point
//!
//! This is the command-line interface that runs one scheduled harvest.

use anyhow::Context;
use attraction_harvester::cache::{CacheSummary, WorkCache};
use attraction_harvester::config::{load_config_with_hash, Config};
use attraction_harvester::pipeline::{Pipeline, PipelineSettings};
use attraction_harvester::sink::{FailureLog, LocalBlobStore, OpenAiEmbedder, PineconeIndex};
use attraction_harvester::{ConfigError, Scraper};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Attraction Harvester: a resumable point-of-interest harvester
///
/// Each invocation leases the next unprocessed cities from the checkpoint,
/// harvests their attractions from the travel-data provider, embeds them,
/// writes a backup, and upserts the vectors. Schedule it to run repeatedly
/// until every city has been processed.
#[derive(Parser, Debug)]
#[command(name = "attraction-harvester")]
#[command(version = "1.0.0")]
#[command(about = "A resumable point-of-interest harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show the pending cities without harvesting
    #[arg(long, conflicts_with_all = ["status", "retry_failed"])]
    dry_run: bool,

    /// Show checkpoint progress and exit
    #[arg(long, conflicts_with_all = ["dry_run", "retry_failed"])]
    status: bool,

    /// Re-queue every failed city and exit
    #[arg(long, conflicts_with_all = ["dry_run", "status"])]
    retry_failed: bool,

    /// Number of cities to process in this run (overrides cities-per-run)
    #[arg(long, value_name = "N")]
    cities: Option<u32>,

    /// Maximum attractions per city (overrides max-attractions)
    #[arg(long, value_name = "N")]
    max_attractions: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if let Some(cities) = cli.cities {
        config.harvest.cities_per_run = cities.max(1);
    }
    if let Some(cap) = cli.max_attractions {
        config.provider.max_attractions = Some(cap.max(1));
    }

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.status {
        handle_status(&config)
    } else if cli.retry_failed {
        handle_retry_failed(&config)
    } else {
        handle_harvest(config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("attraction_harvester=info,warn"),
            1 => EnvFilter::new("attraction_harvester=debug,info"),
            2 => EnvFilter::new("attraction_harvester=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn open_cache(config: &Config) -> anyhow::Result<WorkCache> {
    let path = Path::new(&config.cache.path);
    WorkCache::open(path, config.harvest.cities_per_run as usize)
        .with_context(|| format!("Failed to open checkpoint {}", path.display()))
}

fn print_summary(summary: &CacheSummary) {
    println!("  Total cities: {}", summary.total);
    println!("  Pending: {}", summary.pending);
    println!("  Succeeded: {}", summary.succeeded);
    println!("  Failed: {}", summary.failed);
}

/// Handles the --dry-run mode: validates config and shows the next cities
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Attraction Harvester Dry Run ===\n");

    println!("Provider:");
    println!("  API URL: {}", config.provider.api_url);
    println!("  Max concurrent requests: {}", config.provider.max_concurrent_requests);
    match config.provider.max_attractions {
        Some(cap) => println!("  Max attractions per city: {}", cap),
        None => println!("  Max attractions per city: unlimited"),
    }

    println!("\nHarvest:");
    println!("  Cities per run: {}", config.harvest.cities_per_run);
    println!("  Match distance: {} km", config.harvest.match_distance_km);

    println!("\nOutput:");
    println!("  Checkpoint: {}", config.cache.path);
    println!("  Backups: {}", config.output.backup_dir);
    println!("  Error log: {}", config.output.error_log_dir);

    let cache = open_cache(config)?;
    println!("\nCheckpoint:");
    print_summary(&cache.summary());

    let next: Vec<_> = cache
        .tasks()
        .iter()
        .filter(|task| !task.processed)
        .take(config.harvest.cities_per_run as usize)
        .collect();

    println!("\n✓ Configuration is valid");
    if next.is_empty() {
        println!("✓ Every city has been processed");
    } else {
        println!("✓ Would harvest {} cities:", next.len());
        for task in next {
            println!("  - {}, {} ({})", task.city, task.country, task.namespace);
        }
    }

    Ok(())
}

/// Handles the --status mode: shows checkpoint progress
fn handle_status(config: &Config) -> anyhow::Result<()> {
    let cache = open_cache(config)?;
    println!("Checkpoint: {}\n", config.cache.path);
    print_summary(&cache.summary());

    let failed: Vec<_> = cache
        .tasks()
        .iter()
        .filter(|task| task.processed && !task.success)
        .collect();
    if !failed.is_empty() {
        println!("\nFailed cities:");
        for task in failed {
            println!("  - {}, {} ({})", task.city, task.country, task.namespace);
        }
    }

    Ok(())
}

/// Handles the --retry-failed mode: re-queues failed cities
fn handle_retry_failed(config: &Config) -> anyhow::Result<()> {
    let mut cache = open_cache(config)?;
    let requeued = cache.reset_failed().context("Failed to update checkpoint")?;
    println!("✓ Re-queued {} failed cities", requeued);
    Ok(())
}

/// Handles the main harvest run
async fn handle_harvest(config: Config) -> anyhow::Result<()> {
    let cache = open_cache(&config)?;
    if cache.cache_complete() {
        tracing::info!("Every city in {} has been processed, nothing to do", config.cache.path);
        return Ok(());
    }

    let scraper = Scraper::from_config(&config).context("Failed to set up provider client")?;

    let embedder = OpenAiEmbedder::new(
        &config.embedding.api_url,
        api_key(&config.embedding.api_key_env)?,
        &config.embedding.model,
    )?;
    let index = PineconeIndex::new(
        &config.vector_index.api_url,
        api_key(&config.vector_index.api_key_env)?,
    )?;

    let settings = PipelineSettings {
        embedding_batch_size: config.embedding.batch_size,
        upsert_batch_size: config.vector_index.batch_size,
        overwrite_backups: config.output.overwrite_backups,
    };

    let mut pipeline = Pipeline::new(
        cache,
        scraper,
        Box::new(embedder),
        Box::new(LocalBlobStore::new(&config.output.backup_dir)),
        Box::new(index),
        FailureLog::new(&config.output.error_log_dir),
    )
    .with_settings(settings);

    match pipeline.run().await {
        Ok(summary) => {
            tracing::info!(
                "Harvest completed: {} succeeded, {} failed",
                summary.succeeded.len(),
                summary.failed.len()
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest aborted: {}", e);
            Err(e.into())
        }
    }
}

fn api_key(var: &str) -> anyhow::Result<String> {
    std::env::var(var).map_err(|_| ConfigError::MissingEnv(var.to_string()).into())
}
