//! Configuration module for Paper-Sieve
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional; the defaults reproduce a scan of the NIME archive
//! for "mechatronic" and "mechanic".
//!
//! # Example
//!
//! ```no_run
//! use paper_sieve::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sieve.toml")).unwrap();
//! println!("Scanning {} with {} workers", config.site.archive_url, config.crawler.workers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, OutputConfig, SearchConfig, SiteConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
