use crate::config::types::{Config, IndexMode};
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::{Path, PathBuf};

/// Values supplied on the command line; `Some`/`true` wins over the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub start_url: Option<String>,
    pub output_root: Option<PathBuf>,
    pub project: Option<String>,
    pub exclude: Vec<String>,
    pub force: bool,
    pub rebuild_index: bool,
    pub concurrency: Option<u32>,
    pub max_pages: Option<usize>,
    pub model: Option<String>,
    pub endpoint: Option<String>,
}

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Parsed configuration (not yet validated)
/// * `Err(ConfigError)` - Failed to read or parse the file
pub fn load_config_file(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    Ok(config)
}

/// Builds the effective configuration: defaults, then the optional file, then overrides
///
/// The result is validated before it is returned.
///
/// # Example
///
/// ```no_run
/// use site_distiller::config::{load_config, Overrides};
///
/// let overrides = Overrides {
///     start_url: Some("https://example.com/docs".to_string()),
///     ..Default::default()
/// };
/// let config = load_config(None, overrides).unwrap();
/// assert_eq!(config.project_name(), "example.com");
/// ```
pub fn load_config(path: Option<&Path>, overrides: Overrides) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(path) => load_config_file(path)?,
        None => Config::default(),
    };

    apply_overrides(&mut config, overrides);
    validate(&config)?;

    Ok(config)
}

/// Applies command-line overrides on top of a loaded configuration
pub fn apply_overrides(config: &mut Config, overrides: Overrides) {
    if let Some(start_url) = overrides.start_url {
        config.start_url = start_url;
    }
    if let Some(output_root) = overrides.output_root {
        config.output_root = output_root;
    }
    if let Some(project) = overrides.project {
        config.project = Some(project);
    }
    // Exclusions accumulate rather than replace
    config.exclude.extend(overrides.exclude);
    if overrides.force {
        config.force = true;
    }
    if overrides.rebuild_index {
        config.index_mode = IndexMode::Regenerate;
    }
    if let Some(concurrency) = overrides.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(max_pages) = overrides.max_pages {
        config.crawl.max_pages = Some(max_pages);
    }
    if let Some(model) = overrides.model {
        config.transform.model = model;
    }
    if let Some(endpoint) = overrides.endpoint {
        config.transform.endpoint = endpoint;
    }
}

/// Reads the transformation API key from the configured environment variable
pub fn resolve_api_key(config: &Config) -> Result<String, ConfigError> {
    let var = &config.transform.api_key_env;
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(ConfigError::MissingCredential(var.clone())),
    }
}
