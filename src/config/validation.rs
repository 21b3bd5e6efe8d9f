use crate::config::types::{Config, FetchConfig, SourceEntry, SyncConfig, UserAgentConfig};
use crate::url::parse_http_url;
use crate::ConfigError;
use std::collections::HashSet;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_sync_config(&config.sync)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_fetch_config(&config.fetch)?;
    validate_storage_config(&config.storage)?;
    validate_sources(&config.sources)?;
    Ok(())
}

/// Validates the batch cadence
fn validate_sync_config(config: &SyncConfig) -> Result<(), ConfigError> {
    if config.fixed_delay_ms < 1000 {
        return Err(ConfigError::Validation(format!(
            "fixed_delay_ms must be >= 1000ms, got {}ms",
            config.fixed_delay_ms
        )));
    }
    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.trim().is_empty() {
        return Err(ConfigError::Validation(
            "crawler_version cannot be empty".to_string(),
        ));
    }

    parse_http_url(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    if config.accept_language.trim().is_empty() {
        return Err(ConfigError::Validation(
            "accept_language cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates timeouts and traversal caps
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.connect_timeout_secs == 0 || config.read_timeout_secs == 0 {
        return Err(ConfigError::Validation(format!(
            "timeouts must be >= 1s, got connect={}s read={}s",
            config.connect_timeout_secs, config.read_timeout_secs
        )));
    }

    if config.max_sitemap_files == 0 {
        return Err(ConfigError::Validation(
            "max_sitemap_files must be >= 1".to_string(),
        ));
    }

    if config.max_post_urls == 0 {
        return Err(ConfigError::Validation(
            "max_post_urls must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates storage configuration
fn validate_storage_config(config: &crate::config::types::StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates source entries: unique names, http(s) locations
fn validate_sources(sources: &[SourceEntry]) -> Result<(), ConfigError> {
    let mut names = HashSet::new();

    for entry in sources {
        let name = entry.name.trim();
        if name.is_empty() {
            return Err(ConfigError::Validation(
                "source name cannot be empty".to_string(),
            ));
        }

        if !names.insert(name.to_string()) {
            return Err(ConfigError::Validation(format!(
                "duplicate source name '{}'",
                name
            )));
        }

        parse_http_url(&entry.base_url).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid base-url for '{}': {}", name, e))
        })?;

        if let Some(feed_url) = entry.feed_url.as_deref().filter(|u| !u.trim().is_empty()) {
            parse_http_url(feed_url).map_err(|e| {
                ConfigError::InvalidUrl(format!("Invalid feed-url for '{}': {}", name, e))
            })?;
        }
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    // Domain part should contain at least one dot
    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
