use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure for Site-Distiller
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// First page of the section to distill; also defines the crawl scope
    #[serde(rename = "start-url")]
    pub start_url: String,

    /// Directory that receives one subdirectory per project
    #[serde(rename = "output-root")]
    pub output_root: PathBuf,

    /// Project subdirectory name (defaults to the start URL host)
    pub project: Option<String>,

    /// Path segments that are never crawled (e.g. "/admin")
    pub exclude: Vec<String>,

    /// Regenerate artifacts even when they already exist
    pub force: bool,

    /// How the index file is persisted at the end of the run
    #[serde(rename = "index-mode")]
    pub index_mode: IndexMode,

    /// Maximum number of tasks in flight at once
    pub concurrency: u32,

    pub crawl: CrawlSettings,
    pub chunking: ChunkSettings,
    pub transform: TransformSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            start_url: String::new(),
            output_root: PathBuf::from("./output"),
            project: None,
            exclude: Vec::new(),
            force: false,
            index_mode: IndexMode::Incremental,
            concurrency: 4,
            crawl: CrawlSettings::default(),
            chunking: ChunkSettings::default(),
            transform: TransformSettings::default(),
        }
    }
}

/// Index persistence mode, chosen once per run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexMode {
    /// Append this run's entries to whatever the index already holds
    Incremental,
    /// Rebuild the whole index from this run plus pre-existing artifacts
    Regenerate,
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlSettings {
    /// Soft cap on discovered pages (visited + queued)
    #[serde(rename = "max-pages")]
    pub max_pages: Option<usize>,

    /// Time allowed for a single page load (seconds)
    #[serde(rename = "navigation-timeout-secs")]
    pub navigation_timeout_secs: u64,

    /// User agent sent with every page request
    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            max_pages: None,
            navigation_timeout_secs: 30,
            user_agent: format!("site-distiller/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Content chunking configuration, all sizes in characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChunkSettings {
    /// Content longer than this is split into chunks of at most this size
    pub threshold: usize,

    /// How far back from a window edge to look for a sentence boundary
    pub lookback: usize,

    /// Trailing characters of the previous chunk fed in as context
    pub overlap: usize,
}

impl Default for ChunkSettings {
    fn default() -> Self {
        Self {
            threshold: 120_000,
            lookback: 500,
            overlap: 5_000,
        }
    }
}

/// Transformation service configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TransformSettings {
    /// Base URL of an OpenAI-compatible API
    pub endpoint: String,

    /// Model identifier sent with each request
    pub model: String,

    /// Name of the environment variable holding the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// Timeout for a single transformation request (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,
}

impl Default for TransformSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 300,
        }
    }
}

impl Config {
    /// Returns the project name, falling back to the start URL host
    pub fn project_name(&self) -> String {
        if let Some(project) = self.project.as_deref().filter(|p| !p.is_empty()) {
            return project.to_string();
        }

        ::url::Url::parse(&self.start_url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
            .unwrap_or_else(|| "site".to_string())
    }

    /// Directory holding this project's artifacts and index
    pub fn project_dir(&self) -> PathBuf {
        self.output_root.join(self.project_name())
    }
}
