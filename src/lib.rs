//! Paper-Sieve: a keyword scanner for conference paper archives
//!
//! This crate crawls a single archive listing page, visits every linked paper
//! page with bounded concurrency, pulls the abstract out of the page's BibTeX
//! block, and reports papers whose abstract matches one of the configured
//! keywords together with the first matching sentence.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod text;

use thiserror::Error;

/// Main error type for Paper-Sieve operations
#[derive(Debug, Error)]
pub enum SieveError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to fetch archive page {url}: {cause}")]
    ArchiveFetch {
        url: String,
        cause: crawler::TransportError,
    },

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors raised while pulling fields out of a paper page
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("page has no <h1> title")]
    MissingTitle,
}

/// Result type alias for Paper-Sieve operations
pub type Result<T> = std::result::Result<T, SieveError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, CrawlReport, PaperMatch};
pub use text::{find_sentence_with_keyword, split_sentences, Keyword, KeywordSet};
