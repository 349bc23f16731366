//! Crawler coordinator - main scan orchestration logic
//!
//! This module ties the pipeline together:
//! - Fetching the archive page and collecting candidate links
//! - Fetching candidates concurrently, bounded by a semaphore
//! - Matching each fetched abstract against the keyword set
//! - Aggregating per-paper outcomes into a report

use crate::config::Config;
use crate::crawler::fetcher::{FetchOutcome, PageFetcher, TransportError};
use crate::crawler::links::{CandidateLink, LinkCollector};
use crate::extract::{AbstractExtractor, BibtexExtractor};
use crate::text::{find_sentence_with_keyword, KeywordSet};
use crate::{ExtractionError, SieveError};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// A paper whose abstract matched a keyword
///
/// Serializes to the report columns `Title`, `Link`, `Sentence with Keyword`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PaperMatch {
    #[serde(rename = "Title")]
    pub title: String,

    #[serde(rename = "Link")]
    pub url: String,

    #[serde(rename = "Sentence with Keyword")]
    pub matched_sentence: Option<String>,
}

/// What happened to a single candidate link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaperOutcome {
    /// The abstract matched a keyword
    Matched(PaperMatch),

    /// The page had no abstract, or the abstract matched no keyword
    Skipped { url: String },

    /// The page could not be fetched after all retries
    FetchFailed { url: String, cause: TransportError },

    /// The abstract matched but a required field was missing
    ExtractionFailed { url: String, error: ExtractionError },
}

/// Aggregated results of a scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// Candidate links found on the archive page
    pub candidates: usize,

    /// Matched papers, in completion order
    pub matches: Vec<PaperMatch>,

    /// Papers without an abstract or without a keyword match
    pub skipped: usize,

    /// Papers whose fetch failed terminally
    pub fetch_failures: usize,

    /// Matched papers dropped because the title was missing
    pub extraction_failures: usize,

    /// Paper tasks that panicked; each costs exactly one candidate
    pub task_failures: usize,
}

impl CrawlReport {
    fn record(&mut self, outcome: PaperOutcome) {
        match outcome {
            PaperOutcome::Matched(paper) => self.matches.push(paper),
            PaperOutcome::Skipped { .. } => self.skipped += 1,
            PaperOutcome::FetchFailed { .. } => self.fetch_failures += 1,
            PaperOutcome::ExtractionFailed { .. } => self.extraction_failures += 1,
        }
    }

    /// Number of candidates with a recorded outcome
    pub fn processed(&self) -> usize {
        self.matches.len() + self.skipped + self.fetch_failures + self.extraction_failures
    }

    /// Number of candidates that were attempted, including panicked tasks
    pub fn attempted(&self) -> usize {
        self.processed() + self.task_failures
    }
}

/// Main scan coordinator
///
/// Holds everything a run needs; nothing is mutated during [`Coordinator::run`],
/// so a coordinator can be reused for several archive pages.
pub struct Coordinator {
    fetcher: Arc<PageFetcher>,
    extractor: Arc<dyn AbstractExtractor>,
    keywords: Arc<KeywordSet>,
    collector: LinkCollector,
    workers: usize,
}

impl Coordinator {
    /// Creates a new coordinator from the configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(SieveError)` - Invalid keywords or the HTTP client failed to build
    pub fn new(config: &Config) -> Result<Self, SieveError> {
        let keywords = config.keyword_set()?;
        let fetcher = PageFetcher::from_config(&config.crawler)?;

        Ok(Self {
            fetcher: Arc::new(fetcher),
            extractor: Arc::new(BibtexExtractor::new()),
            keywords: Arc::new(keywords),
            collector: LinkCollector::from_config(&config.site),
            workers: config.crawler.workers.max(1),
        })
    }

    /// Replaces the default BibTeX extractor
    pub fn with_extractor(mut self, extractor: impl AbstractExtractor + 'static) -> Self {
        self.extractor = Arc::new(extractor);
        self
    }

    pub fn keywords(&self) -> &KeywordSet {
        &self.keywords
    }

    /// Scans the archive and returns the matched papers
    ///
    /// Order of the returned matches is completion order and varies between runs.
    pub async fn run(&self, archive_url: &str) -> Result<Vec<PaperMatch>, SieveError> {
        Ok(self.run_with_report(archive_url).await?.matches)
    }

    /// Scans the archive and returns the full report
    ///
    /// 1. Fetch the archive page (a terminal failure aborts the run)
    /// 2. Collect candidate links
    /// 3. Spawn one task per candidate; at most `workers` hold a permit at once
    /// 4. Collect outcomes until every candidate has been attempted
    pub async fn run_with_report(&self, archive_url: &str) -> Result<CrawlReport, SieveError> {
        let start_time = Instant::now();
        tracing::info!("Fetching archive page {}", archive_url);

        let archive = match self.fetcher.fetch(archive_url).await {
            FetchOutcome::Success { body } => body,
            FetchOutcome::RetryableError { cause } | FetchOutcome::TerminalError { cause } => {
                tracing::error!("Failed to fetch the archive page {}: {}", archive_url, cause);
                return Err(SieveError::ArchiveFetch {
                    url: archive_url.to_string(),
                    cause,
                });
            }
        };

        let candidates = self.collector.collect_candidates(&archive);
        let total = candidates.len();
        tracing::info!("Found {} candidate paper links", total);

        let mut report = CrawlReport {
            candidates: total,
            ..CrawlReport::default()
        };

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();

        for candidate in candidates {
            let semaphore = Arc::clone(&semaphore);
            let fetcher = Arc::clone(&self.fetcher);
            let extractor = Arc::clone(&self.extractor);
            let keywords = Arc::clone(&self.keywords);

            tasks.spawn(async move {
                // The semaphore is never closed, so acquiring cannot fail
                let _permit = semaphore.acquire_owned().await;
                process_candidate(&fetcher, extractor.as_ref(), &keywords, candidate).await
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => report.record(outcome),
                Err(e) => {
                    tracing::error!("Paper task failed: {}", e);
                    report.task_failures += 1;
                }
            }

            let attempted = report.attempted();
            if attempted % 10 == 0 {
                tracing::info!(
                    "Progress: {}/{} papers processed, {} matches",
                    attempted,
                    total,
                    report.matches.len()
                );
            }
        }

        tracing::info!(
            "Scan completed: {} candidates, {} matches, {} skipped, {} fetch failures, {} extraction failures, {} task failures in {:?}",
            report.candidates,
            report.matches.len(),
            report.skipped,
            report.fetch_failures,
            report.extraction_failures,
            report.task_failures,
            start_time.elapsed()
        );

        Ok(report)
    }
}

/// Fetches one candidate and matches its page
async fn process_candidate(
    fetcher: &PageFetcher,
    extractor: &dyn AbstractExtractor,
    keywords: &KeywordSet,
    candidate: CandidateLink,
) -> PaperOutcome {
    match fetcher.fetch(&candidate.url).await {
        FetchOutcome::Success { body } => match_paper(extractor, keywords, &candidate.url, &body),
        FetchOutcome::RetryableError { cause } | FetchOutcome::TerminalError { cause } => {
            tracing::warn!("Giving up on {}: {}", candidate.url, cause);
            PaperOutcome::FetchFailed {
                url: candidate.url,
                cause,
            }
        }
    }
}

/// Matches a fetched paper page against the keywords
///
/// Keywords are tried in configured order and the first one found in the
/// abstract wins. The title is only extracted once a keyword has matched.
pub fn match_paper(
    extractor: &dyn AbstractExtractor,
    keywords: &KeywordSet,
    url: &str,
    page: &str,
) -> PaperOutcome {
    let abstract_text = match extractor.extract_abstract(page) {
        Some(text) => text,
        None => {
            tracing::debug!("No abstract found on {}", url);
            return PaperOutcome::Skipped {
                url: url.to_string(),
            };
        }
    };

    let keyword = match keywords.first_match(&abstract_text) {
        Some(keyword) => keyword,
        None => {
            tracing::debug!("No keyword in abstract of {}", url);
            return PaperOutcome::Skipped {
                url: url.to_string(),
            };
        }
    };

    let title = match extractor.extract_title(page) {
        Ok(title) => title,
        Err(error) => {
            tracing::warn!("Keyword '{}' matched {} but: {}", keyword, url, error);
            return PaperOutcome::ExtractionFailed {
                url: url.to_string(),
                error,
            };
        }
    };

    let matched_sentence = find_sentence_with_keyword(&abstract_text, keyword);
    tracing::info!("Found keyword '{}' in paper: {} - {}", keyword, title, url);

    PaperOutcome::Matched(PaperMatch {
        title,
        url: url.to_string(),
        matched_sentence,
    })
}
