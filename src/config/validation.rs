use crate::config::types::{ChunkSettings, Config, CrawlSettings};
use crate::ConfigError;
use url::Url;

/// Upper bound for the task concurrency setting
pub const MAX_CONCURRENCY: u32 = 64;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_start_url(&config.start_url)?;
    validate_concurrency(config.concurrency)?;
    validate_project(&config.project_name())?;
    validate_exclusions(&config.exclude)?;
    validate_crawl_settings(&config.crawl)?;
    validate_chunk_settings(&config.chunking)?;
    Ok(())
}

/// Validates the start URL: http(s) with a host
fn validate_start_url(start_url: &str) -> Result<(), ConfigError> {
    if start_url.is_empty() {
        return Err(ConfigError::Validation(
            "start_url cannot be empty".to_string(),
        ));
    }

    let url = Url::parse(start_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid start_url '{}': {}", start_url, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "start_url '{}' must use http or https",
            start_url
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "start_url '{}' has no host",
            start_url
        )));
    }

    Ok(())
}

fn validate_concurrency(concurrency: u32) -> Result<(), ConfigError> {
    if concurrency < 1 || concurrency > MAX_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and {}, got {}",
            MAX_CONCURRENCY, concurrency
        )));
    }
    Ok(())
}

/// The project name becomes a directory name, so it must be a single path component
fn validate_project(project: &str) -> Result<(), ConfigError> {
    if project.trim().is_empty() {
        return Err(ConfigError::Validation(
            "project cannot be empty".to_string(),
        ));
    }

    if project.contains('/') || project.contains('\\') || project == "." || project == ".." {
        return Err(ConfigError::Validation(format!(
            "project '{}' must be a single directory name",
            project
        )));
    }

    Ok(())
}

fn validate_exclusions(exclusions: &[String]) -> Result<(), ConfigError> {
    for exclusion in exclusions {
        if exclusion.trim_matches('/').is_empty() {
            return Err(ConfigError::Validation(format!(
                "exclusion '{}' does not name a path segment",
                exclusion
            )));
        }
    }
    Ok(())
}

fn validate_crawl_settings(settings: &CrawlSettings) -> Result<(), ConfigError> {
    if settings.navigation_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "navigation_timeout_secs must be > 0".to_string(),
        ));
    }

    if settings.max_pages == Some(0) {
        return Err(ConfigError::Validation(
            "max_pages must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

fn validate_chunk_settings(settings: &ChunkSettings) -> Result<(), ConfigError> {
    if settings.threshold == 0 {
        return Err(ConfigError::Validation(
            "chunking threshold must be > 0".to_string(),
        ));
    }

    if settings.lookback >= settings.threshold {
        return Err(ConfigError::Validation(format!(
            "chunking lookback ({}) must be smaller than threshold ({})",
            settings.lookback, settings.threshold
        )));
    }

    if settings.overlap >= settings.threshold {
        return Err(ConfigError::Validation(format!(
            "chunking overlap ({}) must be smaller than threshold ({})",
            settings.overlap, settings.threshold
        )));
    }

    Ok(())
}
