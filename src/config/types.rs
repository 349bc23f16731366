use crate::text::KeywordSet;
use crate::ConfigError;
use serde::Deserialize;

/// Main configuration structure for Paper-Sieve
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Compiles the configured keywords
    pub fn keyword_set(&self) -> Result<KeywordSet, ConfigError> {
        KeywordSet::new(&self.search.keywords)
    }
}

/// The archive being scanned
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// The listing page that links to every paper
    #[serde(rename = "archive-url")]
    pub archive_url: String,

    /// Scheme and host that root-relative links are resolved against
    pub origin: String,

    /// Links starting with this prefix are DOI redirects and are skipped
    #[serde(rename = "doi-prefix")]
    pub doi_prefix: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            archive_url: "https://nime.org/archives/".to_string(),
            origin: "https://nime.org".to_string(),
            doi_prefix: "https://doi.org".to_string(),
        }
    }
}

/// What to look for in abstracts
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Case-insensitive patterns, checked in order
    pub keywords: Vec<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            keywords: vec!["mechatronic".to_string(), "mechanic".to_string()],
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Number of paper pages fetched concurrently
    pub workers: usize,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout")]
    pub request_timeout: u64,

    /// Total attempts per URL, including the first
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry (milliseconds)
    #[serde(rename = "backoff-base")]
    pub backoff_base: u64,

    /// Factor applied to the delay after each retry
    #[serde(rename = "backoff-multiplier")]
    pub backoff_multiplier: u32,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            workers: 10,
            request_timeout: 10,
            max_attempts: 3,
            backoff_base: 2000,
            backoff_multiplier: 2,
            user_agent: format!("paper-sieve/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory the report is written into
    pub directory: String,

    /// Report file extension, without the dot
    pub extension: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: ".".to_string(),
            extension: "csv".to_string(),
        }
    }
}
