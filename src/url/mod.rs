//! URL handling module for Site-Distiller
//!
//! This module provides URL normalization, the crawl scope predicate and the
//! deterministic mapping from a page URL to its artifact path.

mod normalize;
mod paths;
mod scope;

// Re-export main functions
pub use normalize::normalize;
pub use paths::{
    disambiguate, relative_path_for, sanitize, title_from_relative_path, ARTIFACT_EXTENSION,
    INDEX_FILE_NAME, ROOT_ARTIFACT_NAME,
};
pub use scope::Scope;
