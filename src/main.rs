//! Gitfan main entry point
//!
//! This is the command-line interface for the Gitfan search crawler.

use anyhow::Context;
use clap::Parser;
use gitfan::config::{load_config_with_hash, Config};
use gitfan::crawler::Coordinator;
use gitfan::output::print_statistics;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Gitfan: a fan-out crawler for GitHub search results
///
/// Gitfan runs a search through a proxy, follows every repository it finds
/// and prints the collected language statistics as JSON.
#[derive(Parser, Debug)]
#[command(name = "gitfan")]
#[command(version)]
#[command(about = "A fan-out crawler for GitHub search results", long_about = None)]
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

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// Write the JSON result to this file instead of stdout
    #[arg(short, long, value_name = "FILE", conflicts_with = "dry_run")]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if cli.dry_run {
        handle_dry_run(config)
    } else {
        handle_crawl(config, cli.output, cli.quiet).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr; stdout carries the JSON result.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("gitfan=info,warn"),
            1 => EnvFilter::new("gitfan=debug,info"),
            2 => EnvFilter::new("gitfan=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: Config) -> anyhow::Result<()> {
    let keywords = config.search.keywords.join(", ");
    let proxies = config.proxy.proxies.len();
    let strategy = config.proxy.strategy;
    let scheduler = config.scheduler.clone();
    let http = config.http.clone();

    let coordinator = Coordinator::new(config).context("Invalid configuration")?;

    println!("=== Gitfan Dry Run ===\n");

    println!("Search:");
    println!("  Keywords: {}", keywords);
    println!("  Category: {}", coordinator.category());
    println!("  Search page: {}", coordinator.search_target());
    println!("  Pattern: {}", coordinator.search_pattern());

    println!("\nProxy:");
    println!("  Pool size: {}", proxies);
    println!("  Strategy: {:?}", strategy);
    match coordinator.proxy() {
        Some(proxy) => println!("  Selected: {}", proxy),
        None => println!("  Selected: <direct>"),
    }

    println!("\nScheduler:");
    println!("  Max concurrent jobs: {}", scheduler.max_concurrent_jobs);
    println!("  Progress interval: {}ms", scheduler.progress_interval_ms);

    println!("\nHTTP:");
    println!("  User agent: {}", http.user_agent);
    println!("  Connect timeout: {}s", http.connect_timeout_secs);

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, output: Option<PathBuf>, quiet: bool) -> anyhow::Result<()> {
    tracing::info!(
        "Keywords: {}, category: {}, proxies: {}",
        config.search.keywords.join("+"),
        config.search.category,
        config.proxy.proxies.len()
    );

    let coordinator = Coordinator::new(config).context("Invalid configuration")?;
    let report = coordinator.run().await.context("Crawl failed")?;

    match &output {
        Some(path) => {
            report
                .write_json(path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!("Results written to {}", path.display());
        }
        None => println!("{}", report.to_json_pretty()?),
    }

    if !quiet {
        print_statistics(&report.statistics, report.failures.len());
    }

    Ok(())
}
