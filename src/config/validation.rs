use crate::config::types::{
    Config, CrawlerConfig, FilterConfig, ListingsConfig, OutputConfig, UserAgentConfig,
};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_filter_config(&config.filters)?;
    validate_output_config(&config.output)?;
    validate_listings_config(&config.listings)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_sites < 1 || config.max_concurrent_sites > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_sites must be between 1 and 100, got {}",
            config.max_concurrent_sites
        )));
    }

    if config.min_delay > config.max_delay {
        return Err(ConfigError::Validation(format!(
            "min_delay ({}ms) must not exceed max_delay ({}ms)",
            config.min_delay, config.max_delay
        )));
    }

    if config.request_timeout < 1 {
        return Err(ConfigError::Validation(
            "request_timeout must be >= 1s".to_string(),
        ));
    }

    if config.redirect_timeout < 1 {
        return Err(ConfigError::Validation(
            "redirect_timeout must be >= 1s".to_string(),
        ));
    }

    Ok(())
}

/// Validates the identity pool
///
/// An empty pool is fine as long as some identity remains to fall back on.
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.pool.iter().any(|agent| agent.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "user-agent pool entries cannot be empty".to_string(),
        ));
    }

    if let Some(path) = &config.pool_file {
        if path.is_empty() {
            return Err(ConfigError::Validation(
                "pool_file cannot be an empty path".to_string(),
            ));
        }
    }

    if config.pool.is_empty() && config.pool_file.is_none() && config.default.trim().is_empty() {
        return Err(ConfigError::Validation(
            "no identity available: pool, pool_file and default are all empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates keyword and blacklist overrides
fn validate_filter_config(config: &FilterConfig) -> Result<(), ConfigError> {
    if config.keywords.is_empty() {
        return Err(ConfigError::Validation(
            "keywords cannot be empty".to_string(),
        ));
    }

    if config.keywords.iter().any(|k| k.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "keywords cannot contain empty entries".to_string(),
        ));
    }

    for ext in &config.blacklist_extensions {
        if !ext.starts_with('.') || ext.len() < 2 {
            return Err(ConfigError::Validation(format!(
                "blacklist extension '{}' must look like '.png'",
                ext
            )));
        }
    }

    for domain in &config.blacklist_domains {
        validate_domain_string(domain)?;
    }

    if config.redirect_patterns.iter().any(|p| p.is_empty()) {
        return Err(ConfigError::Validation(
            "redirect patterns cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.websites_path.is_empty() {
        return Err(ConfigError::Validation(
            "websites_path cannot be empty".to_string(),
        ));
    }

    if config.emails_path.is_empty() {
        return Err(ConfigError::Validation(
            "emails_path cannot be empty".to_string(),
        ));
    }

    if config.websites_path == config.emails_path {
        return Err(ConfigError::Validation(format!(
            "websites_path and emails_path must differ, both are '{}'",
            config.websites_path
        )));
    }

    Ok(())
}

/// Validates listing source configuration
fn validate_listings_config(config: &ListingsConfig) -> Result<(), ConfigError> {
    if config.path.is_empty() {
        return Err(ConfigError::Validation(
            "listings path cannot be empty".to_string(),
        ));
    }

    if config.batch_size < 1 {
        return Err(ConfigError::Validation(
            "listings batch_size must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates a domain string
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must contain at least one dot (e.g., 'example.com')",
            domain
        )));
    }

    Ok(())
}
