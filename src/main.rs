//! Ripple-Crawler main entry point
//!
//! This is the command-line interface for the Ripple-Crawler web crawler.

use anyhow::Context;
use clap::Parser;
use ripple_crawler::config::{load_config_with_hash, validate, Config};
use ripple_crawler::crawler::{Crawler, HttpDownloader};
use ripple_crawler::output::{print_statistics, CrawlStatistics};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Ripple-Crawler: a depth-bounded concurrent web crawler
///
/// Downloads pages starting from URL, following links up to --depth levels,
/// with at most PER_HOST simultaneous downloads against any single host.
#[derive(Parser, Debug)]
#[command(name = "ripple-crawler")]
#[command(version)]
#[command(about = "A depth-bounded concurrent web crawler", long_about = None)]
struct Cli {
    /// Seed URL to start crawling from
    #[arg(value_name = "URL")]
    url: String,

    /// Number of download workers
    #[arg(value_name = "DOWNLOADERS")]
    downloaders: Option<usize>,

    /// Number of link extraction workers
    #[arg(value_name = "EXTRACTORS")]
    extractors: Option<usize>,

    /// Maximum simultaneous downloads per host
    #[arg(value_name = "PER_HOST")]
    per_host: Option<usize>,

    /// Maximum crawl depth (the seed is depth 1)
    #[arg(short, long)]
    depth: Option<u32>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = load_effective_config(&cli)?;

    let downloader =
        HttpDownloader::new(&config.user_agent).context("Failed to build HTTP client")?;
    let crawler = Crawler::from_config(Arc::new(downloader), &config.crawler)?;

    tracing::info!(
        "Downloaders: {}, extractors: {}, per host: {}",
        config.crawler.downloaders,
        config.crawler.extractors,
        config.crawler.per_host
    );

    let start_time = Instant::now();
    let outcome = tokio::select! {
        result = crawler.download(&cli.url, config.crawler.max_depth) => Some(result),
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted, abandoning crawl");
            None
        }
    };

    crawler.close().await;

    match outcome {
        Some(Ok(result)) => {
            if !cli.quiet {
                let stats = CrawlStatistics::from_result(&result, start_time.elapsed());
                print_statistics(&result, &stats);
            }
            Ok(())
        }
        Some(Err(e)) => Err(e).with_context(|| format!("Couldn't crawl {}", cli.url)),
        None => Ok(()),
    }
}

/// Builds the configuration from the optional file and CLI overrides
fn load_effective_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if let Some(depth) = cli.depth {
        config.crawler.max_depth = depth;
    }
    if let Some(downloaders) = cli.downloaders {
        config.crawler.downloaders = downloaders;
    }
    if let Some(extractors) = cli.extractors {
        config.crawler.extractors = extractors;
    }
    if let Some(per_host) = cli.per_host {
        config.crawler.per_host = per_host;
    }

    validate(&config).context("Invalid crawl settings")?;
    Ok(config)
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("ripple_crawler=info,warn"),
            1 => EnvFilter::new("ripple_crawler=debug,info"),
            2 => EnvFilter::new("ripple_crawler=trace,debug"),
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
