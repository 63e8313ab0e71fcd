use crate::config::types::{Config, HttpConfig, ProxyConfig, SchedulerConfig, SearchConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_search_config(&config.search)?;
    validate_proxy_config(&config.proxy)?;
    validate_scheduler_config(&config.scheduler)?;
    validate_http_config(&config.http)?;
    Ok(())
}

/// Validates keywords and the base URL
fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    if config.keywords.is_empty() {
        return Err(ConfigError::Validation(
            "keywords must contain at least one entry".to_string(),
        ));
    }

    for keyword in &config.keywords {
        if keyword.is_empty() {
            return Err(ConfigError::Validation(
                "keywords cannot contain empty strings".to_string(),
            ));
        }

        // Keywords are spliced into the query string verbatim
        if keyword
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '&' | '#' | '+'))
        {
            return Err(ConfigError::Validation(format!(
                "keyword '{}' must not contain whitespace, '&', '#' or '+'",
                keyword
            )));
        }
    }

    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' must use http or https",
            config.base_url
        )));
    }

    if url.query().is_some() || url.fragment().is_some() {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' must not carry a query or fragment",
            config.base_url
        )));
    }

    Ok(())
}

/// Validates the proxy pool
fn validate_proxy_config(config: &ProxyConfig) -> Result<(), ConfigError> {
    if config.proxies.is_empty() {
        return Err(ConfigError::Validation(
            "proxies must contain at least one entry".to_string(),
        ));
    }

    for proxy in &config.proxies {
        proxy.validate()?;
    }

    Ok(())
}

/// Validates scheduler limits
fn validate_scheduler_config(config: &SchedulerConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_jobs < 1 || config.max_concurrent_jobs > 256 {
        return Err(ConfigError::Validation(format!(
            "max-concurrent-jobs must be between 1 and 256, got {}",
            config.max_concurrent_jobs
        )));
    }

    if config.progress_interval_ms < 10 {
        return Err(ConfigError::Validation(format!(
            "progress-interval-ms must be >= 10ms, got {}ms",
            config.progress_interval_ms
        )));
    }

    Ok(())
}

/// Validates HTTP client settings
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.connect_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "connect-timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}
