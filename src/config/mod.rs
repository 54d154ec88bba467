//! Configuration module for Site-Distiller
//!
//! Settings come from built-in defaults, an optional TOML file and command-line
//! overrides, in increasing order of precedence. The merged result is validated
//! once, before any crawling starts.
//!
//! # Example
//!
//! ```no_run
//! use site_distiller::config::{load_config, Overrides};
//! use std::path::Path;
//!
//! let config = load_config(Some(Path::new("distill.toml")), Overrides::default()).unwrap();
//! println!("Writing into {}", config.project_dir().display());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{ChunkSettings, Config, CrawlSettings, IndexMode, TransformSettings};

// Re-export parser functions
pub use parser::{apply_overrides, load_config, load_config_file, resolve_api_key, Overrides};
pub use validation::{validate, MAX_CONCURRENCY};
