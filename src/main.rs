//! Sumi-Harvest main entry point
//!
//! This is the command-line interface for the Sumi-Harvest contact-email harvester.

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use sumi_harvest::config::{load_config_with_hash, Config};
use sumi_harvest::crawler::run_harvest;
use sumi_harvest::listing::load_listing_file;
use sumi_harvest::output::{load_statistics, print_statistics, print_tracked_statistics};
use sumi_harvest::storage::open_storage;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Sumi-Harvest: A polite contact-email harvester
///
/// Sumi-Harvest visits the websites of a stream of business listings,
/// scans each homepage and a few contact, about and careers pages for
/// email addresses, and keeps deduplicated sets of tracked websites and
/// emails between runs.
#[derive(Parser, Debug)]
#[command(name = "sumi-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A polite contact-email harvester", long_about = None)]
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

    /// Validate config and show what would be harvested without any network access
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics about the tracked websites and emails and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.stats {
        handle_stats(&config)
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
            0 => EnvFilter::new("sumi_harvest=info,warn"),
            1 => EnvFilter::new("sumi_harvest=debug,info"),
            2 => EnvFilter::new("sumi_harvest=trace,debug"),
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

/// Handles the --dry-run mode: shows the effective settings and listing count
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Sumi-Harvest Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max concurrent sites: {}", config.crawler.max_concurrent_sites);
    println!(
        "  Politeness delay: {}-{}ms",
        config.crawler.min_delay, config.crawler.max_delay
    );
    println!("  Request timeout: {}s", config.crawler.request_timeout);
    println!("  Redirect timeout: {}s", config.crawler.redirect_timeout);
    println!("  Shutdown grace: {}s", config.crawler.shutdown_grace);
    println!(
        "  Track websites without emails: {}",
        config.crawler.track_even_when_empty
    );
    println!(
        "  Dedup before resolving redirects: {}",
        config.crawler.dedup_before_resolve
    );

    println!("\nIdentities:");
    println!("  Inline pool: {}", config.user_agent.pool.len());
    if let Some(pool_file) = &config.user_agent.pool_file {
        println!("  Pool file: {}", pool_file);
    }
    println!("  Default: {}", config.user_agent.default);

    println!("\nFilters:");
    println!("  Keywords: {}", config.filters.keywords.join(", "));
    println!(
        "  Blacklisted extensions: {}",
        config.filters.blacklist_extensions.join(" ")
    );
    println!(
        "  Blacklisted domains: {}",
        config.filters.blacklist_domains.join(", ")
    );
    println!(
        "  Redirect patterns: {}",
        config.filters.redirect_patterns.join(", ")
    );

    println!("\nOutput:");
    println!("  Tracked websites: {}", config.output.websites_path);
    println!("  Tracked emails: {}", config.output.emails_path);

    let source = load_listing_file(Path::new(&config.listings.path), config.listings.batch_size)
        .with_context(|| format!("failed to read listings {}", config.listings.path))?;

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would harvest {} listings from {}",
        source.len(),
        config.listings.path
    );

    Ok(())
}

/// Handles the --stats mode: shows the size of the tracked sets
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Tracked websites: {}", config.output.websites_path);
    println!("Tracked emails: {}\n", config.output.emails_path);

    let storage = open_storage(&config.output)?;
    print_tracked_statistics(&load_statistics(&storage));

    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        "Listings: {}, tracked websites: {}, tracked emails: {}",
        config.listings.path,
        config.output.websites_path,
        config.output.emails_path
    );

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight sites");
            on_interrupt.cancel();
        }
    });

    match run_harvest(config, cancel).await {
        Ok(stats) => {
            tracing::info!("Harvest completed successfully");
            print_statistics(&stats);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}
