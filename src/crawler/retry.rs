//! Retry policy for transient fetch failures
//!
//! The policy only computes delays; sleeping is left to the fetcher so the
//! schedule can be tested without waiting on it.

use crate::config::CrawlerConfig;
use std::time::Duration;

/// Exponential backoff schedule
///
/// Attempt 1 runs immediately. After failed attempt `n` (1-based) the fetcher
/// waits `base_delay * multiplier^(n-1)` before trying again, until
/// `max_attempts` attempts have been made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,

    /// Delay before the first retry
    pub base_delay: Duration,

    /// Factor applied to the delay after every retry
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            multiplier: 2,
        }
    }
}

impl From<&CrawlerConfig> for RetryPolicy {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay: Duration::from_millis(config.backoff_base),
            multiplier: config.backoff_multiplier,
        }
    }
}

impl RetryPolicy {
    /// Returns the delay to wait after failed attempt `attempt` (1-based)
    ///
    /// # Returns
    ///
    /// * `Some(Duration)` - Wait this long, then make another attempt
    /// * `None` - The retry budget is exhausted
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt >= self.max_attempts {
            return None;
        }

        let factor = self.multiplier.saturating_pow(attempt - 1);
        Some(self.base_delay.saturating_mul(factor))
    }

    /// The full list of delays a URL that always fails would go through
    pub fn schedule(&self) -> Vec<Duration> {
        (1..self.max_attempts)
            .filter_map(|attempt| self.delay_after(attempt))
            .collect()
    }

    /// Sum of every backoff delay in the schedule
    pub fn total_backoff(&self) -> Duration {
        self.schedule().into_iter().sum()
    }
}
