use crate::config::types::{
    Config, CrawlerConfig, HttpConfig, OutputConfig, ProxyConfig, TargetConfig,
};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_target_config(&config.target)?;
    validate_http_config(&config.http)?;
    if let Some(proxy) = &config.proxy {
        validate_proxy_config(proxy)?;
    }
    validate_output_config(&config.output)?;
    validate_keywords(&config.keywords)?;
    Ok(())
}

/// Validates a keyword list; an empty list is allowed here, blank entries are not
pub fn validate_keywords(keywords: &[String]) -> Result<(), ConfigError> {
    if let Some(position) = keywords.iter().position(|k| k.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "keyword #{} is blank",
            position + 1
        )));
    }
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.pool_size < 1 || config.pool_size > 100 {
        return Err(ConfigError::Validation(format!(
            "pool_size must be between 1 and 100, got {}",
            config.pool_size
        )));
    }

    Ok(())
}

/// Validates the search target
fn validate_target_config(config: &TargetConfig) -> Result<(), ConfigError> {
    validate_http_url("base_url", &config.base_url)?;

    if !config.search_path.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "search_path must start with '/', got '{}'",
            config.search_path
        )));
    }

    Selector::parse(&config.last_page_selector).map_err(|e| {
        ConfigError::InvalidSelector(format!("'{}': {}", config.last_page_selector, e))
    })?;

    if config.accepted_statuses.is_empty() {
        return Err(ConfigError::Validation(
            "accepted_statuses cannot be empty".to_string(),
        ));
    }

    if let Some(status) = config
        .accepted_statuses
        .iter()
        .find(|s| !(100..=599).contains(*s))
    {
        return Err(ConfigError::Validation(format!(
            "accepted_statuses contains invalid status code {}",
            status
        )));
    }

    Ok(())
}

/// Validates HTTP client configuration
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.timeout == 0 {
        return Err(ConfigError::Validation(
            "timeout must be at least 1 second".to_string(),
        ));
    }

    Ok(())
}

/// Validates the forwarding proxy section
fn validate_proxy_config(config: &ProxyConfig) -> Result<(), ConfigError> {
    validate_http_url("proxy endpoint", &config.endpoint)?;

    if config.api_key.trim().is_empty() {
        return Err(ConfigError::Validation(
            "proxy api_key cannot be empty".to_string(),
        ));
    }

    if config.country.trim().is_empty() {
        return Err(ConfigError::Validation(
            "proxy country cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.csv_path.is_empty() {
        return Err(ConfigError::Validation(
            "csv_path cannot be empty".to_string(),
        ));
    }

    if config.flush_threshold == 0 {
        return Err(ConfigError::Validation(
            "flush_threshold must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_http_url(label: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", label, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            label, value
        )));
    }

    Ok(())
}
