//! Configuration for the suggestion engine.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::SuggestResult;

/// Main configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Matching and blending settings.
    #[serde(default)]
    pub matching: MatchingConfig,

    /// External reranker settings.
    #[serde(default)]
    pub reranker: RerankerConfig,
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format (text, json).
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// HTTP listen port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            port: default_port(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_port() -> u16 {
    3100
}

/// Storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite database with the person registries and household links.
    #[serde(default = "default_registry_db")]
    pub registry_db: PathBuf,

    /// SQLite database for learned suggestion patterns.
    #[serde(default = "default_learning_db")]
    pub learning_db: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            registry_db: default_registry_db(),
            learning_db: default_learning_db(),
        }
    }
}

fn default_registry_db() -> PathBuf {
    PathBuf::from(".sambahayan/registry.db")
}

fn default_learning_db() -> PathBuf {
    PathBuf::from(".sambahayan/learning.db")
}

/// Matching and learned-confidence blending settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Learned confidence above this replaces the rule-assigned label.
    #[serde(default = "default_label_threshold")]
    pub label_threshold: f64,

    /// Learned confidence above this forces the tier to high.
    #[serde(default = "default_tier_threshold")]
    pub tier_threshold: f64,

    /// Minimum times a pattern must have been shown before it is trusted.
    #[serde(default = "default_significance_floor")]
    pub significance_floor: u32,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            label_threshold: default_label_threshold(),
            tier_threshold: default_tier_threshold(),
            significance_floor: default_significance_floor(),
        }
    }
}

fn default_label_threshold() -> f64 {
    0.6
}

fn default_tier_threshold() -> f64 {
    0.8
}

fn default_significance_floor() -> u32 {
    5
}

/// External AI reranker settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankerConfig {
    /// Enabled. Even when enabled, each request opts in via `use_ai`.
    #[serde(default)]
    pub enabled: bool,

    /// Endpoint URL of the relationship-analysis service.
    #[serde(default)]
    pub endpoint: String,

    /// Request timeout (in seconds).
    #[serde(default = "default_reranker_timeout")]
    pub timeout_secs: u64,
}

impl Default for RerankerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: String::new(),
            timeout_secs: default_reranker_timeout(),
        }
    }
}

fn default_reranker_timeout() -> u64 {
    10
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> SuggestResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Saves configuration to a TOML file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> SuggestResult<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Tries to load configuration from the current directory or uses defaults.
    pub fn load_or_default() -> Self {
        Self::load("sambahayan.toml").unwrap_or_default()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            storage: StorageConfig::default(),
            matching: MatchingConfig::default(),
            reranker: RerankerConfig::default(),
        }
    }
}
