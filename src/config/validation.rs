use crate::config::types::{Config, CrawlerConfig, OutputConfig, SearchConfig, SiteConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_search_config(&config.search)?;
    validate_crawler_config(&config.crawler)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the archive location
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    validate_http_url("archive-url", &config.archive_url)?;
    validate_http_url("origin", &config.origin)?;

    if config.doi_prefix.trim().is_empty() {
        return Err(ConfigError::Validation(
            "doi-prefix cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the keyword list
fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    if config.keywords.is_empty() {
        return Err(ConfigError::Validation(
            "at least one keyword is required".to_string(),
        ));
    }

    if let Some(position) = config.keywords.iter().position(|k| k.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "keyword #{} is blank",
            position + 1
        )));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > 100 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 100, got {}",
            config.workers
        )));
    }

    if config.request_timeout < 1 {
        return Err(ConfigError::Validation(format!(
            "request-timeout must be >= 1s, got {}s",
            config.request_timeout
        )));
    }

    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if config.backoff_multiplier < 1 {
        return Err(ConfigError::Validation(format!(
            "backoff-multiplier must be >= 1, got {}",
            config.backoff_multiplier
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    let extension = config.extension.trim_start_matches('.');
    if extension.is_empty() {
        return Err(ConfigError::Validation(
            "output extension cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Checks that `value` parses as an http(s) URL
fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            field, value
        )));
    }

    Ok(())
}
