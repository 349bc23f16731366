//! Paper-Sieve main entry point
//!
//! This is the command-line interface for the Paper-Sieve archive scanner.

use anyhow::Context;
use clap::Parser;
use paper_sieve::config::{load_config_with_hash, validate, Config};
use paper_sieve::crawler::{crawl_and_report, RetryPolicy};
use paper_sieve::output::report_file_name;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Paper-Sieve: find conference papers whose abstract mentions a keyword
///
/// Paper-Sieve reads the archive listing page, visits every linked paper,
/// and writes the papers whose abstract matches one of the keywords to a CSV
/// file named after the keywords.
#[derive(Parser, Debug)]
#[command(name = "paper-sieve")]
#[command(version)]
#[command(about = "Scan a conference archive for keywords in paper abstracts", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Keyword to search for; repeat to search for several (replaces configured keywords)
    #[arg(short, long = "keyword", value_name = "KEYWORD")]
    keywords: Vec<String>,

    /// Directory the CSV report is written into
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be scanned without fetching anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    apply_overrides(&mut config, &cli);
    validate(&config).context("invalid configuration")?;

    if cli.dry_run {
        return handle_dry_run(&config);
    }

    handle_scan(&config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("paper_sieve=info,warn"),
            1 => EnvFilter::new("paper_sieve=debug,info"),
            2 => EnvFilter::new("paper_sieve=trace,debug"),
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

/// Command-line flags take precedence over the configuration file
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if !cli.keywords.is_empty() {
        config.search.keywords = cli.keywords.clone();
    }

    if let Some(dir) = &cli.output_dir {
        config.output.directory = dir.display().to_string();
    }
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    let keywords = config.keyword_set()?;

    println!("=== Paper-Sieve Dry Run ===\n");

    println!("Site:");
    println!("  Archive page: {}", config.site.archive_url);
    println!("  Origin: {}", config.site.origin);
    println!("  DOI prefix (skipped): {}", config.site.doi_prefix);

    println!("\nKeywords ({}):", keywords.len());
    for keyword in keywords.iter() {
        println!("  - {}", keyword);
    }

    println!("\nCrawler:");
    println!("  Workers: {}", config.crawler.workers);
    println!("  Request timeout: {}s", config.crawler.request_timeout);
    println!(
        "  Attempts: {} (backoff {}ms x{})",
        config.crawler.max_attempts, config.crawler.backoff_base, config.crawler.backoff_multiplier
    );
    println!(
        "  Worst-case backoff per paper: {:?}",
        RetryPolicy::from(&config.crawler).total_backoff()
    );
    println!("  User agent: {}", config.crawler.user_agent);

    let file_name = report_file_name(&keywords, &config.output.extension);
    let report_path = PathBuf::from(&config.output.directory).join(file_name);
    println!("\nOutput:");
    println!("  Report: {}", report_path.display());

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the main scan operation
async fn handle_scan(config: &Config) -> anyhow::Result<()> {
    tracing::info!(
        "Scanning {} for {} keyword(s)",
        config.site.archive_url,
        config.search.keywords.len()
    );

    match crawl_and_report(config).await {
        Ok((report, path)) => {
            tracing::info!(
                "Scan completed successfully: {} of {} papers matched",
                report.matches.len(),
                report.candidates
            );
            println!("\nResults have been saved to {}", path.display());
            Ok(())
        }
        Err(e) => {
            tracing::error!("Scan failed: {}", e);
            Err(e.into())
        }
    }
}
