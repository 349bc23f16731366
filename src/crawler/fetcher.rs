//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the shared HTTP client with user agent and timeout
//! - Classifying each attempt as success, retryable or terminal
//! - Retrying transient failures with exponential backoff

use crate::config::CrawlerConfig;
use crate::crawler::retry::RetryPolicy;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// Transport-level failure of a single request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The request exceeded the client timeout
    #[error("request timed out")]
    Timeout,

    /// Connection refused, DNS failure, TLS failure
    #[error("connection failed: {0}")]
    Connect(String),

    /// Server answered with a non-2xx status
    #[error("HTTP {0}")]
    Status(u16),

    /// The response body could not be read
    #[error("failed to read body: {0}")]
    Body(String),

    /// The URL cannot be turned into a request at all
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Any other client error
    #[error("{0}")]
    Request(String),
}

impl TransportError {
    /// Returns true if another attempt might succeed
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::InvalidUrl(_))
    }

    fn from_reqwest(error: &reqwest::Error) -> Self {
        if error.is_builder() {
            Self::InvalidUrl(error.to_string())
        } else if error.is_timeout() {
            Self::Timeout
        } else if error.is_connect() {
            Self::Connect(error.to_string())
        } else if error.is_body() || error.is_decode() {
            Self::Body(error.to_string())
        } else {
            Self::Request(error.to_string())
        }
    }
}

/// Result of a fetch operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// 2xx response with its body
    Success { body: String },

    /// A failure another attempt might fix
    RetryableError { cause: TransportError },

    /// A failure that will not be retried, either because retrying cannot
    /// help or because the retry budget is spent
    TerminalError { cause: TransportError },
}

impl FetchOutcome {
    fn from_error(cause: TransportError) -> Self {
        if cause.is_retryable() {
            Self::RetryableError { cause }
        } else {
            Self::TerminalError { cause }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The User-Agent header value
/// * `timeout` - Per-request timeout, covering connect and body
///
/// # Example
///
/// ```no_run
/// use paper_sieve::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client("paper-sieve/0.1", Duration::from_secs(10)).unwrap();
/// ```
pub fn build_http_client(user_agent: &str, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(timeout)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches pages with retry and backoff
///
/// The fetcher wraps one [`Client`], so every task that shares it also shares
/// the connection pool.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
    policy: RetryPolicy,
}

impl PageFetcher {
    pub fn new(client: Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// Builds a fetcher from the crawler section of the configuration
    pub fn from_config(config: &CrawlerConfig) -> Result<Self, reqwest::Error> {
        let client = build_http_client(
            &config.user_agent,
            Duration::from_secs(config.request_timeout),
        )?;
        Ok(Self::new(client, RetryPolicy::from(config)))
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetches a URL, retrying transient failures
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | HTTP 2xx | Immediate → Success |
    /// | HTTP non-2xx | Retry with backoff |
    /// | Timeout | Retry with backoff |
    /// | Connection failure | Retry with backoff |
    /// | Body read failure | Retry with backoff |
    /// | Unusable URL | Immediate → TerminalError |
    ///
    /// After the last attempt fails, the last cause is returned as a
    /// `TerminalError`. This never returns `RetryableError`.
    pub async fn fetch(&self, url: &str) -> FetchOutcome {
        let mut attempt = 1;

        loop {
            let cause = match self.fetch_once(url).await {
                FetchOutcome::Success { body } => return FetchOutcome::Success { body },
                FetchOutcome::TerminalError { cause } => {
                    tracing::warn!(
                        "Error fetching {} on attempt {}: {} (not retrying)",
                        url,
                        attempt,
                        cause
                    );
                    return FetchOutcome::TerminalError { cause };
                }
                FetchOutcome::RetryableError { cause } => cause,
            };

            tracing::warn!("Error fetching {} on attempt {}: {}", url, attempt, cause);

            match self.policy.delay_after(attempt) {
                Some(delay) => {
                    tracing::debug!("Retrying {} in {:?}", url, delay);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                None => return FetchOutcome::TerminalError { cause },
            }
        }
    }

    /// Performs a single GET and classifies the result
    pub async fn fetch_once(&self, url: &str) -> FetchOutcome {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return FetchOutcome::from_error(TransportError::from_reqwest(&e)),
        };

        let status = response.status();
        if !status.is_success() {
            return FetchOutcome::from_error(TransportError::Status(status.as_u16()));
        }

        match response.text().await {
            Ok(body) => FetchOutcome::Success { body },
            Err(e) => FetchOutcome::from_error(TransportError::Body(e.to_string())),
        }
    }
}
