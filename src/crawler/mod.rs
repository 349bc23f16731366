//! Crawler module for archive scanning
//!
//! This module contains the core scanning logic, including:
//! - HTTP fetching with retry and backoff
//! - Candidate link collection from the archive page
//! - The worker pool that fetches, extracts and matches papers

mod coordinator;
mod fetcher;
mod links;
mod retry;

pub use coordinator::{match_paper, Coordinator, CrawlReport, PaperMatch, PaperOutcome};
pub use fetcher::{build_http_client, FetchOutcome, PageFetcher, TransportError};
pub use links::{CandidateLink, LinkCollector};
pub use retry::RetryPolicy;

use crate::config::Config;
use crate::output::{CsvReportWriter, MatchWriter};
use crate::SieveError;
use std::path::PathBuf;

/// Runs a complete scan of the configured archive
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Every candidate was attempted
/// * `Err(SieveError)` - The configuration was unusable or the archive page
///   could not be fetched
pub async fn crawl(config: &Config) -> Result<CrawlReport, SieveError> {
    let coordinator = Coordinator::new(config)?;
    coordinator.run_with_report(&config.site.archive_url).await
}

/// Runs a scan and writes the matches to the keyword-named CSV report
///
/// The report is only written once the scan has finished, so a run that
/// aborts on the archive page leaves no file behind.
///
/// # Example
///
/// ```no_run
/// use paper_sieve::config::Config;
/// use paper_sieve::crawler::crawl_and_report;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (report, path) = crawl_and_report(&Config::default()).await?;
/// println!("{} matches written to {}", report.matches.len(), path.display());
/// # Ok(())
/// # }
/// ```
pub async fn crawl_and_report(config: &Config) -> Result<(CrawlReport, PathBuf), SieveError> {
    let coordinator = Coordinator::new(config)?;
    let writer = CsvReportWriter::for_keywords(&config.output, coordinator.keywords());

    let report = coordinator
        .run_with_report(&config.site.archive_url)
        .await?;
    writer.write_matches(&report.matches)?;

    Ok((report, writer.location().to_path_buf()))
}
