//! Feed-Tide main entry point
//!
//! This is the command-line interface for the Feed-Tide ingestion pipeline.

use clap::Parser;
use feed_tide::config::{load_config_with_hash, Config};
use feed_tide::ingest::{Fetcher, ParserRegistry, SitemapCrawler};
use feed_tide::storage::{open_storage, register_sources, SqliteStorage, Storage};
use feed_tide::sync::{run_periodic, SourceOutcome};
use feed_tide::{BatchReport, SyncOrchestrator, SyncResult};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Feed-Tide: a tech blog post ingestion pipeline
///
/// Feed-Tide collects posts from technical blogs through their feeds or
/// sitemaps and merges them into one store, deduplicated by canonical URL.
/// Without a mode flag it syncs all active sources periodically.
#[derive(Parser, Debug)]
#[command(name = "feed-tide")]
#[command(version = "1.0.0")]
#[command(about = "A tech blog post ingestion pipeline", long_about = None)]
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

    /// Run one batch over the active sources and exit
    #[arg(long, conflicts_with_all = ["sync", "backfill", "dry_run", "stats"])]
    once: bool,

    /// Sync one source by ID, ignoring its interval
    #[arg(long, value_name = "ID", conflicts_with_all = ["backfill", "dry_run", "stats"])]
    sync: Option<i64>,

    /// Backfill one source by ID from its sitemap
    #[arg(long, value_name = "ID", conflicts_with_all = ["dry_run", "stats"])]
    backfill: Option<i64>,

    /// Sitemap to crawl instead of the resolved one (with --backfill)
    #[arg(long, value_name = "URL", requires = "backfill")]
    sitemap_url: Option<String>,

    /// Validate config and show the configured sources without syncing
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long)]
    stats: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        return handle_dry_run(&config);
    }
    if cli.stats {
        return handle_stats(&config);
    }

    let mut orchestrator = build_orchestrator(&config)?;

    if let Some(source_id) = cli.backfill {
        let result = orchestrator
            .backfill_source_by_id(source_id, cli.sitemap_url.as_deref())
            .await?;
        print_result("Backfill", &result);
    } else if let Some(source_id) = cli.sync {
        let result = orchestrator.sync_source_by_id(source_id).await?;
        print_result("Sync", &result);
    } else if cli.once {
        let report = orchestrator.sync_active_sources().await?;
        print_report(&report);
    } else {
        let fixed_delay = Duration::from_millis(config.sync.fixed_delay_ms);
        tracing::info!(
            "Starting periodic sync every {}s (Ctrl-C to stop)",
            fixed_delay.as_secs()
        );
        let batches = run_periodic(&mut orchestrator, fixed_delay).await;
        tracing::info!("Stopped after {} batches", batches);
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("feed_tide=info,warn"),
            1 => EnvFilter::new("feed_tide=debug,info"),
            2 => EnvFilter::new("feed_tide=trace,debug"),
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

/// Opens the store, registers configured sources, and wires the parsers
fn build_orchestrator(
    config: &Config,
) -> Result<SyncOrchestrator<SqliteStorage>, Box<dyn std::error::Error>> {
    let mut storage = open_storage(Path::new(&config.storage.database_path))?;
    let ids = register_sources(&mut storage, &config.sources)?;
    tracing::info!("Registered {} configured sources", ids.len());

    let fetcher = Fetcher::new(&config.user_agent, &config.fetch)?;
    let parsers = ParserRegistry::with_defaults(fetcher.clone(), &config.fetch)?;
    let discovery = SitemapCrawler::new(fetcher, &config.fetch);

    Ok(SyncOrchestrator::new(storage, parsers, Box::new(discovery)))
}

/// Handles the --dry-run mode: validates config and shows the sources
fn handle_dry_run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Feed-Tide Dry Run ===\n");

    println!("Sync:");
    println!("  Fixed delay: {}ms", config.sync.fixed_delay_ms);

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);
    println!("  Accept-Language: {}", config.user_agent.accept_language);

    println!("\nFetch:");
    println!("  Connect timeout: {}s", config.fetch.connect_timeout_secs);
    println!("  Read timeout: {}s", config.fetch.read_timeout_secs);
    println!("  Max sitemap files: {}", config.fetch.max_sitemap_files);
    println!("  Max post URLs: {}", config.fetch.max_post_urls);

    println!("\nStorage:");
    println!("  Database: {}", config.storage.database_path);

    println!("\nSources ({}):", config.sources.len());
    for source in &config.sources {
        let interval = source
            .interval_min
            .filter(|minutes| *minutes > 0)
            .map(|minutes| format!("every {}min", minutes))
            .unwrap_or_else(|| "every batch".to_string());
        println!(
            "  - {} [{}] {} ({}{})",
            source.name,
            source.parser_type,
            source.base_url,
            interval,
            if source.active { "" } else { ", inactive" }
        );
        if let Some(feed_url) = &source.feed_url {
            println!("    * {}", feed_url);
        }
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would sync {} active sources",
        config.sources.iter().filter(|s| s.active).count()
    );

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("Database: {}\n", config.storage.database_path);

    let storage = open_storage(Path::new(&config.storage.database_path))?;
    let stats = storage.statistics()?;

    println!("=== Feed-Tide Statistics ===");
    println!("Sources: {} ({} active)", stats.sources, stats.active_sources);
    println!("Posts: {}", stats.posts);
    println!("Tags: {}", stats.tags);
    println!(
        "Sync jobs: {} completed, {} failed, {} running",
        stats.completed_jobs, stats.failed_jobs, stats.running_jobs
    );

    Ok(())
}

fn print_result(label: &str, result: &SyncResult) {
    println!(
        "✓ {} of {}: {} parsed, {} saved",
        label, result.source_name, result.parsed_count, result.saved_count
    );
}

fn print_report(report: &BatchReport) {
    for source in &report.sources {
        match &source.outcome {
            SourceOutcome::Skipped => println!("- {} (#{}): skipped", source.source_name, source.source_id),
            SourceOutcome::Synced(result) => print_result("Sync", result),
            SourceOutcome::Failed(message) => {
                println!("✗ {} (#{}): {}", source.source_name, source.source_id, message)
            }
        }
    }
    println!(
        "\n{} synced, {} skipped, {} failed, {} posts saved",
        report.synced_count(),
        report.skipped_count(),
        report.failed_count(),
        report.saved_total()
    );
}
