//! vlr-harvest main entry point
//!
//! This is the command-line interface for the vlr-harvest listing scraper.

use anyhow::{bail, Context};
use clap::Parser;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use vlr_harvest::config::{load_config_with_hash, Config};
use vlr_harvest::crawler::{run_batch, Walker, RANKINGS_SELECTOR};
use vlr_harvest::output::{print_manifest, print_report, upload_manifest};

/// vlr-harvest: a polite paginated listing scraper
///
/// vlr-harvest walks the thread, match and ranking listings of vlr.gg under
/// a token-bucket rate limit and writes every listing to one JSON artifact.
#[derive(Parser, Debug)]
#[command(name = "vlr-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A polite paginated listing scraper", long_about = None)]
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

    /// Validate config and show what would be scraped without fetching anything
    #[arg(long, conflicts_with = "manifest")]
    dry_run: bool,

    /// Only run the named listing (repeatable; "rankings" selects the ranking fan-out)
    #[arg(long, value_name = "NAME")]
    only: Vec<String>,

    /// Print the upload manifest of the output directory and exit
    #[arg(long, conflicts_with = "dry_run")]
    manifest: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    warn_unknown_selections(&config, &cli.only);

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config, &cli.only)
    } else if cli.manifest {
        handle_manifest(&config)
    } else {
        handle_scrape(&config, &cli.only).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("vlr_harvest=info,warn"),
            1 => EnvFilter::new("vlr_harvest=debug,info"),
            2 => EnvFilter::new("vlr_harvest=trace,debug"),
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

fn warn_unknown_selections(config: &Config, only: &[String]) {
    for name in only {
        let known = name == RANKINGS_SELECTOR || config.listings.iter().any(|l| &l.name == name);
        if !known {
            tracing::warn!("--only {} matches no configured listing", name);
        }
    }
}

/// Handles the --dry-run mode: validates config and shows what would be scraped
fn handle_dry_run(config: &Config, only: &[String]) -> anyhow::Result<()> {
    let walker = Walker::new(config).context("Failed to build HTTP client")?;

    println!("=== vlr-harvest Dry Run ===\n");

    println!("Scraper Configuration:");
    println!("  Base URL: {}", walker.base_url());
    println!(
        "  Rate: {} req/s (burst {})",
        config.scraper.requests_per_second, config.scraper.burst
    );
    println!("  Walk timeout: {}s", config.scraper.walk_timeout_secs);
    println!("  Request timeout: {}s", config.scraper.request_timeout_secs);
    println!(
        "  Detail fetches rate limited: {}",
        config.scraper.rate_limit_detail_fetches
    );

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);
    println!("  Timestamp suffix: {}", config.output.timestamp_suffix);

    println!("\nListings ({}):", config.listings.len());
    for listing in &config.listings {
        let selected = only.is_empty() || only.contains(&listing.name);
        println!(
            "  {} {} ({}) <- {}",
            if selected { "-" } else { "x" },
            listing.name,
            listing.kind,
            walker.listing_url(listing, None)?
        );
        println!(
            "      -> {}",
            walker.artifact_path(&listing.name).display()
        );
    }

    if config.rankings.enabled {
        println!(
            "\nRankings: {}",
            walker.rankings_url(&config.rankings.section, None)?
        );
    } else {
        println!("\nRankings: disabled");
    }

    println!("\n✓ Configuration is valid");
    Ok(())
}

/// Handles the --manifest mode: lists the artifacts for the uploader
fn handle_manifest(config: &Config) -> anyhow::Result<()> {
    let dir = Path::new(&config.output.directory);
    let entries = upload_manifest(dir)
        .with_context(|| format!("Failed to read output directory {}", dir.display()))?;
    tracing::info!("{} artifacts under {}", entries.len(), dir.display());
    print_manifest(&entries);
    Ok(())
}

/// Handles the main scrape operation
async fn handle_scrape(config: &Config, only: &[String]) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();

    // Ctrl-C soft-stops the current walk and skips the rest of the batch
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, flushing collected pages");
            on_signal.cancel();
        }
    });

    tracing::info!(
        "Listings: {}, rankings: {}",
        config.listings.len(),
        if config.rankings.enabled { "enabled" } else { "disabled" }
    );

    let report = run_batch(config, only, cancel)
        .await
        .context("Batch could not start")?;

    print_report(&report);
    if !report.is_success() {
        bail!("{} scrape job(s) failed", report.failures());
    }
    Ok(())
}
