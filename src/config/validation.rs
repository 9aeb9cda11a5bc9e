use crate::config::types::{
    Config, ListingKind, ListingSource, OutputConfig, ScraperConfig, UserAgentConfig,
};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scraper_config(&config.scraper)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_listings(&config.listings)?;

    if config.rankings.enabled && config.rankings.section.trim().is_empty() {
        return Err(ConfigError::Validation(
            "rankings.section cannot be empty when rankings are enabled".to_string(),
        ));
    }

    Ok(())
}

/// Validates scraper configuration
fn validate_scraper_config(config: &ScraperConfig) -> Result<(), ConfigError> {
    let base = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if base.scheme() != "https" && base.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url must be an HTTP(S) URL, got '{}'",
            config.base_url
        )));
    }

    if config.https_only && base.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "base_url '{}' must use HTTPS while https_only is set",
            config.base_url
        )));
    }

    if config.requests_per_second < 1 || config.requests_per_second > 100 {
        return Err(ConfigError::Validation(format!(
            "requests_per_second must be between 1 and 100, got {}",
            config.requests_per_second
        )));
    }

    if config.burst < 1 {
        return Err(ConfigError::Validation(format!(
            "burst must be >= 1, got {}",
            config.burst
        )));
    }

    if config.walk_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "walk_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
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

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates listing entries
fn validate_listings(listings: &[ListingSource]) -> Result<(), ConfigError> {
    let mut names = HashSet::new();

    for listing in listings {
        if !is_valid_artifact_name(&listing.name) {
            return Err(ConfigError::Validation(format!(
                "Listing name '{}' must be non-empty and contain only alphanumerics, '-' or '_'",
                listing.name
            )));
        }

        if !names.insert(listing.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Duplicate listing name '{}'",
                listing.name
            )));
        }

        if listing.section.trim().is_empty() || listing.section.contains('?') {
            return Err(ConfigError::Validation(format!(
                "Listing '{}' needs a section path without a query",
                listing.name
            )));
        }

        if !listing.query.is_empty() && !listing.query.starts_with('?') {
            return Err(ConfigError::Validation(format!(
                "Listing '{}' query must start with '?', got '{}'",
                listing.name, listing.query
            )));
        }

        // Rankings are a single page per region and are driven by [rankings]
        if listing.kind == ListingKind::Rankings {
            return Err(ConfigError::Validation(format!(
                "Listing '{}' cannot use kind 'rankings'; configure [rankings] instead",
                listing.name
            )));
        }
    }

    Ok(())
}

fn is_valid_artifact_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
