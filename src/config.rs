//! Runtime configuration for delve.
//!
//! Configuration is resolved in three layers: built-in defaults, an optional
//! `delve.toml` file, and CLI flags (applied by the command layer). API keys
//! are never stored here; the oracle and search providers read them from the
//! environment.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_MAX_REPLANS: u32 = 2;
pub const DEFAULT_MAX_RETRIES_PER_STEP: u32 = 2;
pub const DEFAULT_SUBTASK_CONCURRENCY: usize = 4;
pub const DEFAULT_TOP_N_URLS: usize = 3;
pub const DEFAULT_ENTITY_VALUE_CAP: usize = 10;
pub const DEFAULT_QUERY_LENGTH_LIMIT: usize = 400;
pub const DEFAULT_MAX_CONTENT_CHARS: usize = 300_000;
pub const DEFAULT_SEARCH_MAX_RESULTS: usize = 7;
/// 0-10 scale; sub-task results scoring at or below this are replaced by a
/// synthetic estimate when estimate mode is on.
pub const DEFAULT_LOW_QUALITY_THRESHOLD: u8 = 3;
pub const DEFAULT_CLARITY_THRESHOLD: f32 = 0.6;

/// Resolved runtime configuration.
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub model: String,
    pub max_replans: u32,
    pub max_retries_per_step: u32,
    pub subtask_concurrency: usize,
    pub top_n_urls: usize,
    pub entity_value_cap: usize,
    pub query_length_limit: usize,
    pub max_content_chars: usize,
    pub search_max_results: usize,
    pub low_quality_threshold: u8,
    pub clarity_threshold: f32,
    pub use_estimates: bool,
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_replans: DEFAULT_MAX_REPLANS,
            max_retries_per_step: DEFAULT_MAX_RETRIES_PER_STEP,
            subtask_concurrency: DEFAULT_SUBTASK_CONCURRENCY,
            top_n_urls: DEFAULT_TOP_N_URLS,
            entity_value_cap: DEFAULT_ENTITY_VALUE_CAP,
            query_length_limit: DEFAULT_QUERY_LENGTH_LIMIT,
            max_content_chars: DEFAULT_MAX_CONTENT_CHARS,
            search_max_results: DEFAULT_SEARCH_MAX_RESULTS,
            low_quality_threshold: DEFAULT_LOW_QUALITY_THRESHOLD,
            clarity_threshold: DEFAULT_CLARITY_THRESHOLD,
            use_estimates: false,
            verbose: false,
        }
    }
}

/// On-disk configuration file (`delve.toml`). Every field is optional;
/// unset fields fall through to defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub model: Option<String>,
    pub max_replans: Option<u32>,
    pub max_retries_per_step: Option<u32>,
    pub subtask_concurrency: Option<usize>,
    pub top_n_urls: Option<usize>,
    pub entity_value_cap: Option<usize>,
    pub query_length_limit: Option<usize>,
    pub max_content_chars: Option<usize>,
    pub search_max_results: Option<usize>,
    pub low_quality_threshold: Option<u8>,
    pub clarity_threshold: Option<f32>,
    pub use_estimates: Option<bool>,
}

impl Config {
    /// Load configuration, merging `delve.toml` (explicit path, or the one
    /// in the current directory if present) over the defaults.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        let path = match file {
            Some(p) => Some(p.to_path_buf()),
            None => {
                let default = Path::new("delve.toml");
                default.exists().then(|| default.to_path_buf())
            }
        };

        if let Some(path) = path {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            let file: ConfigFile = toml::from_str(&raw)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?;
            config.merge_file(file);
        }

        Ok(config)
    }

    fn merge_file(&mut self, file: ConfigFile) {
        if let Some(v) = file.model {
            self.model = v;
        }
        if let Some(v) = file.max_replans {
            self.max_replans = v;
        }
        if let Some(v) = file.max_retries_per_step {
            self.max_retries_per_step = v;
        }
        if let Some(v) = file.subtask_concurrency {
            self.subtask_concurrency = v.max(1);
        }
        if let Some(v) = file.top_n_urls {
            self.top_n_urls = v.max(1);
        }
        if let Some(v) = file.entity_value_cap {
            self.entity_value_cap = v.max(1);
        }
        if let Some(v) = file.query_length_limit {
            self.query_length_limit = v;
        }
        if let Some(v) = file.max_content_chars {
            self.max_content_chars = v;
        }
        if let Some(v) = file.search_max_results {
            self.search_max_results = v.max(1);
        }
        if let Some(v) = file.low_quality_threshold {
            self.low_quality_threshold = v.min(10);
        }
        if let Some(v) = file.clarity_threshold {
            self.clarity_threshold = v.clamp(0.0, 1.0);
        }
        if let Some(v) = file.use_estimates {
            self.use_estimates = v;
        }
    }
}
