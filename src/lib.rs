//! Site-Distiller: turns a scoped website section into transformed text artifacts
//!
//! This crate crawls every page under a start URL, sends each page's content
//! through an external transformation service, writes one artifact per page and
//! maintains an index of the results. Runs are resumable: a page whose artifact
//! already exists is skipped unless regeneration is forced.

pub mod config;
pub mod crawler;
pub mod output;
pub mod pipeline;
pub mod state;
pub mod transform;
pub mod url;

use std::path::PathBuf;
use thiserror::Error;

pub use crawler::{FetchError, FetchErrorKind};
pub use transform::{TransformError, TransformErrorKind};

/// Main error type for Site-Distiller operations
#[derive(Debug, Error)]
pub enum DistillError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Transformation error: {0}")]
    Transform(#[from] TransformError),

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::TaskStatus,
        to: state::TaskStatus,
    },

    #[error("Crawl of {url} produced no pages")]
    EmptyCrawl { url: String },

    #[error("Page content unavailable for {url}")]
    MissingContent { url: String },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Missing credential: environment variable {0} is not set")]
    MissingCredential(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Site-Distiller operations
pub type Result<T> = std::result::Result<T, DistillError>;

// Re-export commonly used types
pub use config::Config;
pub use pipeline::{Coordinator, RunOutcome};
pub use state::{Task, TaskState, TaskStatus};
pub use crate::url::{normalize, Scope};
