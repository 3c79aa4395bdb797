//! Turn configuration into a ready memory.

use std::sync::Arc;
use std::time::Duration;

use amem_config::{AmemConfig, ExtractorBackend, ExtractorConfig, MemoryConfig};
use amem_llm::OpenAiConfig;
use amem_memory::{
    AgenticMemory, HeuristicExtractor, LlmExtractor, MemoryParams, SharedExtractor, SharedMemory,
};
use anyhow::Result;
use tracing::info;

/// Map the `[memory]` section onto memory tunables.
pub fn memory_params(config: &MemoryConfig) -> MemoryParams {
    MemoryParams {
        max_notes: config.max_notes,
        decay_rate: config.decay_rate,
        spread_factor: config.spread_factor,
        activation_threshold: config.activation_threshold,
        link_threshold: config.link_threshold,
        eviction_fraction: config.eviction_fraction,
        consolidation_interval: Duration::from_secs(config.consolidation_interval_secs),
        symmetric_consolidation_links: config.symmetric_consolidation_links,
        default_limit: config.recall.limit,
        default_min_relevance: config.recall.min_relevance,
        max_seeds: config.recall.max_seeds,
        seed_threshold: config.recall.seed_threshold,
        spread_steps: config.recall.spread_steps,
        time_budget: config.recall.time_budget_ms.map(Duration::from_millis),
    }
}

/// Map the `[extractor]` section onto an OpenAI-compatible backend config.
///
/// A missing `api_key_env` means no auth header (local servers).
pub fn backend_config(config: &ExtractorConfig) -> Result<OpenAiConfig> {
    let base = match config.resolve_api_key()? {
        Some(key) => OpenAiConfig::openai(key),
        None => OpenAiConfig::default(),
    };
    Ok(base
        .with_base_url(config.base_url.as_str())
        .with_model(config.model.as_str())
        .with_timeout(Duration::from_secs(config.timeout_secs))
        .with_max_retries(config.max_retries))
}

/// Build the keyword extractor named by the `[extractor]` section.
pub fn build_extractor(config: &ExtractorConfig) -> Result<SharedExtractor> {
    match config.backend {
        ExtractorBackend::Heuristic => Ok(Arc::new(HeuristicExtractor::new())),
        ExtractorBackend::OpenAi => {
            let backend = amem_llm::create_shared_backend(backend_config(config)?)?;
            info!(base_url = %config.base_url, model = %config.model, "Using LLM keyword extractor");
            Ok(Arc::new(LlmExtractor::new(backend, config.model.clone())))
        }
    }
}

/// Build a shared memory from the full configuration.
pub fn build_memory(config: &AmemConfig) -> Result<SharedMemory> {
    let params = memory_params(&config.memory());
    let extractor = build_extractor(&config.extractor())?;
    let memory = AgenticMemory::new(params, extractor)?;
    Ok(SharedMemory::new(memory))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_maps_to_default_params() {
        let params = memory_params(&MemoryConfig::default());
        assert_eq!(params, MemoryParams::default());
    }

    #[test]
    fn test_time_budget_mapping() {
        let mut config = MemoryConfig::default();
        config.recall.time_budget_ms = Some(250);
        config.consolidation_interval_secs = 5;
        let params = memory_params(&config);
        assert_eq!(params.time_budget, Some(Duration::from_millis(250)));
        assert_eq!(params.consolidation_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_memory_config_is_rejected() {
        let config = AmemConfig::from_toml("[memory]\ndecay_rate = 1.5\n").unwrap();
        assert!(build_memory(&config).is_err());
    }

    #[test]
    fn test_openai_without_key_is_rejected() {
        let config = ExtractorConfig {
            backend: ExtractorBackend::OpenAi,
            api_key_env: Some("AMEM_TEST_NO_SUCH_KEY".to_string()),
            ..Default::default()
        };
        assert!(build_extractor(&config).is_err());
    }

    #[test]
    fn test_backend_config_follows_extractor_section() {
        let config = ExtractorConfig {
            backend: ExtractorBackend::OpenAi,
            base_url: "http://localhost:8080/v1".to_string(),
            model: "tiny-keywords".to_string(),
            api_key_env: None,
            timeout_secs: 7,
            max_retries: 1,
        };
        let backend = backend_config(&config).unwrap();
        assert_eq!(backend.api_key, None);
        assert_eq!(backend.base_url, "http://localhost:8080/v1");
        assert_eq!(backend.model.as_deref(), Some("tiny-keywords"));
        assert_eq!(backend.timeout, Duration::from_secs(7));
        assert_eq!(backend.max_retries, 1);
    }

    #[test]
    fn test_openai_without_auth_builds() {
        let config = ExtractorConfig {
            backend: ExtractorBackend::OpenAi,
            base_url: "http://localhost:11434/v1".to_string(),
            api_key_env: None,
            ..Default::default()
        };
        let extractor = build_extractor(&config).unwrap();
        assert_eq!(extractor.name(), "llm");
    }
}
