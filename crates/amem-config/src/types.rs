//! Configuration types mapping to the TOML schema.
//!
//! Top-level config:
//! ```toml
//! [memory]            # graph tunables and capacity
//! [memory.recall]     # recall defaults and spreading budget
//! [extractor]         # keyword extractor backend
//! [logging]           # file logging
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// All sections are optional so that partial configs (e.g., project-local
/// overrides) can be loaded and merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmemConfig {
    /// Memory graph configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<MemoryConfig>,

    /// Keyword extractor configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extractor: Option<ExtractorConfig>,

    /// Logging configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

impl AmemConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    ///
    /// Merging is per section: a section present in `other` replaces the
    /// whole section here.
    pub fn merge(&mut self, other: AmemConfig) {
        if other.memory.is_some() {
            self.memory = other.memory;
        }

        if other.extractor.is_some() {
            self.extractor = other.extractor;
        }

        if other.logging.is_some() {
            self.logging = other.logging;
        }
    }

    /// Memory section, or defaults when absent.
    pub fn memory(&self) -> MemoryConfig {
        self.memory.clone().unwrap_or_default()
    }

    /// Extractor section, or defaults when absent.
    pub fn extractor(&self) -> ExtractorConfig {
        self.extractor.clone().unwrap_or_default()
    }

    /// Logging section, or defaults when absent.
    pub fn logging(&self) -> LoggingConfig {
        self.logging.clone().unwrap_or_default()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Memory
// ─────────────────────────────────────────────────────────────────────────────

/// Memory graph tunables.
///
/// ```toml
/// [memory]
/// max_notes = 1000
/// decay_rate = 0.1
/// spread_factor = 0.7
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Capacity before eviction kicks in.
    pub max_notes: usize,
    /// Per-step decay applied while spreading activation.
    pub decay_rate: f32,
    /// Fraction of activation passed along an edge.
    pub spread_factor: f32,
    /// Minimum activation a node needs to spread further.
    pub activation_threshold: f32,
    /// Minimum similarity for the store-time linking pass.
    pub link_threshold: f32,
    /// Share of notes removed when capacity is exceeded.
    pub eviction_fraction: f32,
    /// Minimum seconds between two consolidation runs.
    pub consolidation_interval_secs: u64,
    /// Record consolidation links in both directions.
    pub symmetric_consolidation_links: bool,
    /// Recall defaults.
    pub recall: RecallConfig,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_notes: 1000,
            decay_rate: 0.1,
            spread_factor: 0.7,
            activation_threshold: 0.1,
            link_threshold: 0.3,
            eviction_fraction: 0.1,
            consolidation_interval_secs: 3600,
            symmetric_consolidation_links: true,
            recall: RecallConfig::default(),
        }
    }
}

/// Recall defaults and spreading budget.
///
/// ```toml
/// [memory.recall]
/// limit = 10
/// min_relevance = 0.1
/// time_budget_ms = 250
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecallConfig {
    /// Default number of results.
    pub limit: usize,
    /// Default minimum activation for a result.
    pub min_relevance: f32,
    /// Maximum number of seed nodes.
    pub max_seeds: usize,
    /// Seed relevance must exceed this value.
    pub seed_threshold: f32,
    /// Number of spreading steps.
    pub spread_steps: usize,
    /// Optional wall-clock budget for the spreading pass.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_budget_ms: Option<u64>,
}

impl Default for RecallConfig {
    fn default() -> Self {
        Self {
            limit: 10,
            min_relevance: 0.1,
            max_seeds: 20,
            seed_threshold: 0.1,
            spread_steps: 3,
            time_budget_ms: None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Extractor
// ─────────────────────────────────────────────────────────────────────────────

/// Which keyword extractor to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractorBackend {
    /// Local stopword/frequency heuristic.
    #[default]
    Heuristic,
    /// OpenAI-compatible chat completion API, falling back to the heuristic.
    OpenAi,
}

impl std::str::FromStr for ExtractorBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "heuristic" => Ok(Self::Heuristic),
            "openai" => Ok(Self::OpenAi),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

/// Keyword extractor configuration.
///
/// ```toml
/// [extractor]
/// backend = "openai"
/// model = "gpt-4o-mini"
/// api_key_env = "OPENAI_API_KEY"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    pub backend: ExtractorBackend,
    /// API base URL for the OpenAI-compatible backend.
    pub base_url: String,
    pub model: String,
    /// Environment variable holding the API key. Empty means no auth header.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            backend: ExtractorBackend::Heuristic,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: Some("OPENAI_API_KEY".to_string()),
            timeout_secs: 30,
            max_retries: 2,
        }
    }
}

impl ExtractorConfig {
    /// Resolve the API key from the configured environment variable.
    ///
    /// Returns `Ok(None)` when no variable is configured (e.g., local Ollama).
    pub fn resolve_api_key(&self) -> Result<Option<String>> {
        match &self.api_key_env {
            None => Ok(None),
            Some(var) if var.is_empty() => Ok(None),
            Some(var) => std::env::var(var)
                .map(Some)
                .map_err(|_| ConfigError::ApiKeyNotFound {
                    env_var: var.clone(),
                }),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging
// ─────────────────────────────────────────────────────────────────────────────

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Write a rotating JSON log file.
    pub file: bool,
    /// Log directory. Defaults to `<config dir>/logs`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: true,
            directory: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AmemConfig::from_toml("").unwrap();
        assert!(config.memory.is_none());
        assert_eq!(config.memory(), MemoryConfig::default());
        assert_eq!(config.extractor().backend, ExtractorBackend::Heuristic);
        assert!(config.logging().file);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[memory]
max_notes = 50
decay_rate = 0.2
symmetric_consolidation_links = false

[memory.recall]
limit = 5
time_budget_ms = 100

[extractor]
backend = "openai"
model = "llama3"
base_url = "http://localhost:11434/v1"

[logging]
file = false
"#;
        let config = AmemConfig::from_toml(toml).unwrap();
        let memory = config.memory();
        assert_eq!(memory.max_notes, 50);
        assert_eq!(memory.decay_rate, 0.2);
        // Unspecified fields keep their defaults.
        assert_eq!(memory.spread_factor, 0.7);
        assert!(!memory.symmetric_consolidation_links);
        assert_eq!(memory.recall.limit, 5);
        assert_eq!(memory.recall.max_seeds, 20);
        assert_eq!(memory.recall.time_budget_ms, Some(100));

        let extractor = config.extractor();
        assert_eq!(extractor.backend, ExtractorBackend::OpenAi);
        assert_eq!(extractor.model, "llama3");
        assert!(!config.logging().file);
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let err = AmemConfig::from_toml("[extractor]\nbackend = \"bard\"\n");
        assert!(err.is_err());
        assert!("bard".parse::<ExtractorBackend>().is_err());
        assert_eq!(
            "OpenAI".parse::<ExtractorBackend>().unwrap(),
            ExtractorBackend::OpenAi
        );
    }

    #[test]
    fn test_merge_overrides_sections() {
        let mut base = AmemConfig::from_toml("[memory]\nmax_notes = 10\n[logging]\nfile = false\n")
            .unwrap();
        let overlay = AmemConfig::from_toml("[memory]\nmax_notes = 20\n").unwrap();
        base.merge(overlay);

        assert_eq!(base.memory().max_notes, 20);
        assert!(!base.logging().file);
    }

    #[test]
    fn test_roundtrip_toml() {
        let mut config = AmemConfig::new();
        config.memory = Some(MemoryConfig {
            max_notes: 77,
            ..Default::default()
        });
        let text = config.to_toml().unwrap();
        let parsed = AmemConfig::from_toml(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_missing_api_key_env() {
        let config = ExtractorConfig {
            api_key_env: Some("AMEM_TEST_DEFINITELY_UNSET_KEY".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            config.resolve_api_key(),
            Err(ConfigError::ApiKeyNotFound { .. })
        ));

        let no_key = ExtractorConfig {
            api_key_env: None,
            ..Default::default()
        };
        assert_eq!(no_key.resolve_api_key().unwrap(), None);
    }
}
