use crate::config::types::{Config, CrawlerConfig, OutputConfig, SiteConfig};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_crawler_config(&config.crawler)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates site configuration
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let base = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "base-url must use http or https, got '{}'",
            base.scheme()
        )));
    }

    // Without the placeholder every page would resolve to the same URL.
    if !config.page_url_template.contains("{page}") {
        return Err(ConfigError::Validation(
            "page-url-template must contain the {page} placeholder".to_string(),
        ));
    }

    validate_selector("listing-selector", &config.listing_selector)?;
    validate_selector("link-selector", &config.link_selector)?;
    validate_selector("detail-selector", &config.detail_selector)?;

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.request_timeout_secs < 1 || config.request_timeout_secs > 300 {
        return Err(ConfigError::Validation(format!(
            "request-timeout-secs must be between 1 and 300, got {}",
            config.request_timeout_secs
        )));
    }

    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    if config.backoff_base_ms < 1 {
        return Err(ConfigError::Validation(format!(
            "backoff-base-ms must be >= 1, got {}",
            config.backoff_base_ms
        )));
    }

    if config.backoff_jitter_ms > 60_000 {
        return Err(ConfigError::Validation(format!(
            "backoff-jitter-ms must be <= 60000, got {}",
            config.backoff_jitter_ms
        )));
    }

    if config.pause_min_ms > config.pause_max_ms {
        return Err(ConfigError::Validation(format!(
            "pause-min-ms ({}) cannot exceed pause-max-ms ({})",
            config.pause_min_ms, config.pause_max_ms
        )));
    }

    if config.pause_max_ms > 120_000 {
        return Err(ConfigError::Validation(format!(
            "pause-max-ms must be <= 120000, got {}",
            config.pause_max_ms
        )));
    }

    if config.detail_workers < 1 || config.detail_workers > 16 {
        return Err(ConfigError::Validation(format!(
            "detail-workers must be between 1 and 16, got {}",
            config.detail_workers
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates that a CSS selector parses
fn validate_selector(field: &str, selector: &str) -> Result<(), ConfigError> {
    if selector.trim().is_empty() {
        return Err(ConfigError::Validation(format!(
            "{} cannot be empty",
            field
        )));
    }

    Selector::parse(selector).map_err(|_| ConfigError::InvalidSelector {
        field: field.to_string(),
        selector: selector.to_string(),
    })?;

    Ok(())
}
