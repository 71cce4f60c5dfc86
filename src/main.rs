//! Search-Trawler main entry point
//!
//! This is the command-line interface for the Search-Trawler results harvester.

use anyhow::Context;
use clap::Parser;
use search_trawler::config::{load_config_with_hash, validate_keywords, Config};
use search_trawler::crawler::Coordinator;
use search_trawler::output::print_statistics;
use search_trawler::url::{ProxyEndpoint, SearchTemplate};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Search-Trawler: a keyword-driven search results harvester
///
/// Search-Trawler fetches the result pages of a search site for each keyword,
/// follows pagination up to a configured depth, and appends every distinct
/// result to a CSV file.
#[derive(Parser, Debug)]
#[command(name = "search-trawler")]
#[command(version)]
#[command(about = "A keyword-driven search results harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Keywords to crawl (replaces the `keywords` list from the config)
    #[arg(value_name = "KEYWORDS")]
    keywords: Vec<String>,

    /// CSV file to append results to (replaces `output.csv-path`)
    #[arg(short, long, value_name = "CSV")]
    output: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if !cli.keywords.is_empty() {
        config.keywords = cli.keywords;
    }
    if let Some(output) = cli.output {
        config.output.csv_path = output.display().to_string();
    }
    validate_keywords(&config.keywords).context("Invalid keyword list")?;

    if cli.dry_run {
        handle_dry_run(&config)
    } else {
        handle_crawl(config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("search_trawler=info,warn"),
            1 => EnvFilter::new("search_trawler=debug,info"),
            2 => EnvFilter::new("search_trawler=trace,debug"),
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

/// Handles the --dry-run mode: shows the resolved config and the seed URLs
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Search-Trawler Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Pool size: {}", config.crawler.pool_size);
    println!("  Retries: {}", config.crawler.retries);
    match config.crawler.max_page_depth {
        0 => println!("  Max page depth: unlimited"),
        depth => println!("  Max page depth: {}", depth),
    }
    println!(
        "  Politeness interval: {}ms",
        config.crawler.politeness_interval
    );

    println!("\nHTTP:");
    println!("  User agent: {}", config.http.user_agent);
    println!("  Timeout: {}s", config.http.timeout);
    println!("  Accepted statuses: {:?}", config.target.accepted_statuses);

    if let Some(proxy) = &config.proxy {
        println!("\nProxy:");
        println!("  Endpoint: {}", proxy.endpoint);
        println!("  Country: {}", proxy.country);
    }

    println!("\nOutput:");
    println!("  CSV: {}", config.output.csv_path);
    println!("  Flush threshold: {}", config.output.flush_threshold);

    let template = SearchTemplate::from_config(&config.target)?;
    let proxy = config
        .proxy
        .as_ref()
        .map(ProxyEndpoint::from_config)
        .transpose()?;

    println!("\nKeywords ({}):", config.keywords.len());
    for keyword in &config.keywords {
        let url = template.page_url(keyword, 1);
        println!("  - {}", keyword);
        println!("    * {}", url);
        if let Some(proxy) = &proxy {
            println!("      via {}", proxy.wrap(url.as_str()));
        }
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would start crawling with {} seed URLs",
        config.keywords.len()
    );

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    let keywords = config.keywords.clone();
    tracing::info!(
        "Keywords: {}, pool size: {}, output: {}",
        keywords.len(),
        config.crawler.pool_size,
        config.output.csv_path
    );

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight pages");
            interrupt.cancel();
        }
    });

    let coordinator = Coordinator::from_config(config)?;
    match coordinator.run(&keywords, cancel).await {
        Ok(stats) => {
            tracing::info!("Crawl completed successfully");
            print_statistics(&stats);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
