use serde::{Deserialize, Serialize};

/// Engine configuration, env-driven with sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModScoutConfig {
    pub embedding_provider: String,
    pub embedding_model: String,
    pub embedding_url: String,
    pub embedding_api_key: Option<String>,
    pub embedding_timeout: u64,

    pub embedding_fallback_enabled: bool,
    pub embedding_fallback_url: String,
    pub embedding_fallback_model: String,

    pub reranker_model: String,
    pub reranker_api_key: Option<String>,
    pub reranker_base_url: Option<String>,
    pub reranker_timeout: u64,
    pub reranker_max_concurrency: usize,

    pub cache_size: usize,
    pub cache_ttl: u64,

    pub topic_expansion_k: usize,
    pub topic_expansion_threshold: f32,

    pub rerank_candidate_limit: usize,
    pub rerank_result_limit: usize,

    pub default_page_size: usize,
}

impl ModScoutConfig {
    pub fn new() -> Self {
        Self {
            embedding_provider: "ollama".to_string(),
            embedding_model: crate::DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_url: crate::DEFAULT_OLLAMA_URL.to_string(),
            embedding_api_key: None,
            embedding_timeout: 30,

            embedding_fallback_enabled: true,
            embedding_fallback_url: crate::DEFAULT_OLLAMA_URL.to_string(),
            embedding_fallback_model: crate::DEFAULT_EMBEDDING_MODEL.to_string(),

            reranker_model: crate::DEFAULT_RERANKER_MODEL.to_string(),
            reranker_api_key: None,
            reranker_base_url: None,
            reranker_timeout: 30,
            reranker_max_concurrency: 4,

            cache_size: crate::DEFAULT_CACHE_SIZE,
            cache_ttl: crate::DEFAULT_CACHE_TTL,

            topic_expansion_k: 4,
            topic_expansion_threshold: 0.5,

            rerank_candidate_limit: 30,
            rerank_result_limit: 15,

            default_page_size: 10,
        }
    }

    pub fn from_env() -> Self {
        let mut config = Self::new();

        if let Ok(provider) = std::env::var("MODSCOUT_EMBEDDING_PROVIDER") {
            config.embedding_provider = provider;
        }
        if let Ok(model) = std::env::var("MODSCOUT_EMBEDDING_MODEL") {
            config.embedding_model = model;
        }
        if let Ok(url) = std::env::var("MODSCOUT_EMBEDDING_URL") {
            config.embedding_url = url;
        }
        if let Ok(key) = std::env::var("MODSCOUT_EMBEDDING_API_KEY") {
            config.embedding_api_key = Some(key);
        }
        if let Ok(model) = std::env::var("MODSCOUT_RERANKER_MODEL") {
            config.reranker_model = model;
        }
        if let Ok(key) = std::env::var("MODSCOUT_RERANKER_API_KEY") {
            config.reranker_api_key = Some(key);
        }
        if let Ok(url) = std::env::var("MODSCOUT_RERANKER_BASE_URL") {
            config.reranker_base_url = Some(url);
        }
        if let Ok(k) = std::env::var("MODSCOUT_TOPIC_EXPANSION_K") {
            if let Ok(k) = k.parse() {
                config.topic_expansion_k = k;
            }
        }
        if let Ok(t) = std::env::var("MODSCOUT_TOPIC_EXPANSION_THRESHOLD") {
            if let Ok(t) = t.parse() {
                config.topic_expansion_threshold = t;
            }
        }

        config
    }
}

impl Default for ModScoutConfig {
    fn default() -> Self {
        Self::new()
    }
}
