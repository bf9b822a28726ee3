use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::core::cache::QueryCache;
use crate::core::config::ModScoutConfig;

#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Empty text")]
    EmptyText,

    #[error("Provider not implemented: {0}")]
    NotImplemented(String),

    #[error("Both primary and fallback failed: primary={0}, fallback={1}")]
    BothFailed(String, String),
}

/// Text-to-vector collaborator. The returned dimensionality must match the
/// stored topic embeddings; the vector index enforces this.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

#[derive(Serialize)]
struct OllamaEmbeddingRequest {
    model: String,
    prompt: String,
}

#[derive(Deserialize)]
struct OllamaEmbeddingResponse {
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct OpenAiEmbeddingRequest {
    model: String,
    input: String,
}

#[derive(Deserialize)]
struct OpenAiEmbeddingResponse {
    data: Vec<OpenAiEmbeddingData>,
}

#[derive(Deserialize)]
struct OpenAiEmbeddingData {
    embedding: Vec<f32>,
}

/// HTTP embedding client with a bounded cache and an optional Ollama
/// fallback. A timeout or failure on both legs is a hard error; topic
/// matching cannot degrade silently to wrong vectors.
pub struct EmbeddingGenerator {
    provider: String,
    url: String,
    model: String,
    api_key: Option<String>,
    client: Client,
    cache: QueryCache<Vec<f32>>,

    fallback_enabled: bool,
    fallback_url: String,
    fallback_model: String,
    using_fallback: AtomicBool,
    fallback_count: AtomicUsize,
}

impl EmbeddingGenerator {
    pub fn new(
        provider: impl Into<String>,
        url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout_secs: u64,
        cache_size: usize,
        cache_ttl: u64,
        fallback_enabled: bool,
        fallback_url: impl Into<String>,
        fallback_model: impl Into<String>,
    ) -> Self {
        let provider = provider.into().to_lowercase();
        let model = model.into();

        info!(
            "EmbeddingGenerator initialized: provider={}, model={}, cache={}",
            provider, model, cache_size
        );

        Self {
            provider,
            url: url.into(),
            model,
            api_key,
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            cache: QueryCache::new(cache_size, cache_ttl),
            fallback_enabled,
            fallback_url: fallback_url.into(),
            fallback_model: fallback_model.into(),
            using_fallback: AtomicBool::new(false),
            fallback_count: AtomicUsize::new(0),
        }
    }

    pub fn from_config(config: &ModScoutConfig) -> Self {
        Self::new(
            config.embedding_provider.clone(),
            config.embedding_url.clone(),
            config.embedding_model.clone(),
            config.embedding_api_key.clone(),
            config.embedding_timeout,
            config.cache_size,
            config.cache_ttl,
            config.embedding_fallback_enabled,
            config.embedding_fallback_url.clone(),
            config.embedding_fallback_model.clone(),
        )
    }

    async fn generate(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::EmptyText);
        }

        let key = QueryCache::<Vec<f32>>::make_key(&[&self.provider, &self.model, text]);
        if let Some(cached) = self.cache.get(&key) {
            debug!("Embedding cache hit for: {}", crate::utils::safe_truncate(text, 50));
            return Ok(cached);
        }

        let result = match self.provider.as_str() {
            "ollama" => self.generate_ollama(text).await,
            "openai" => self.generate_openai(text).await,
            other => Err(EmbeddingError::NotImplemented(other.to_string())),
        };

        match result {
            Ok(embedding) => {
                self.cache.set(&key, embedding.clone());
                self.using_fallback.store(false, Ordering::SeqCst);
                Ok(embedding)
            }
            Err(e) => {
                if self.fallback_enabled && self.provider != "ollama" {
                    debug!("Primary embedding provider unavailable, trying fallback: {}", e);
                    let embedding = self.fallback_to_ollama(text, &e).await?;
                    self.cache.set(&key, embedding.clone());
                    Ok(embedding)
                } else {
                    Err(e)
                }
            }
        }
    }

    async fn generate_ollama(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let request = OllamaEmbeddingRequest {
            model: self.model.clone(),
            prompt: text.to_string(),
        };

        let response = self
            .client
            .post(format!("{}/api/embeddings", self.url))
            .json(&request)
            .send()
            .await?
            .error_for_status()
            .map_err(EmbeddingError::Http)?
            .json::<OllamaEmbeddingResponse>()
            .await?;

        Ok(response.embedding)
    }

    async fn generate_openai(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| EmbeddingError::InvalidResponse("API key required".to_string()))?;

        let request = OpenAiEmbeddingRequest {
            model: self.model.clone(),
            input: text.to_string(),
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.url.trim_end_matches('/')))
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&request)
            .send()
            .await?
            .error_for_status()
            .map_err(EmbeddingError::Http)?
            .json::<OpenAiEmbeddingResponse>()
            .await?;

        response
            .data
            .first()
            .map(|d| d.embedding.clone())
            .ok_or_else(|| EmbeddingError::InvalidResponse("No embedding in response".to_string()))
    }

    async fn fallback_to_ollama(
        &self,
        text: &str,
        original_error: &EmbeddingError,
    ) -> Result<Vec<f32>, EmbeddingError> {
        info!(
            "Using fallback Ollama ({}/{}) - primary unavailable",
            self.fallback_url, self.fallback_model
        );

        let request = OllamaEmbeddingRequest {
            model: self.fallback_model.clone(),
            prompt: text.to_string(),
        };

        let response = self
            .client
            .post(format!("{}/api/embeddings", self.fallback_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| EmbeddingError::BothFailed(original_error.to_string(), e.to_string()))?
            .error_for_status()
            .map_err(|e| EmbeddingError::BothFailed(original_error.to_string(), e.to_string()))?
            .json::<OllamaEmbeddingResponse>()
            .await
            .map_err(|e| EmbeddingError::BothFailed(original_error.to_string(), e.to_string()))?;

        self.using_fallback.store(true, Ordering::SeqCst);
        self.fallback_count.fetch_add(1, Ordering::SeqCst);

        Ok(response.embedding)
    }

    pub fn is_using_fallback(&self) -> bool {
        self.using_fallback.load(Ordering::SeqCst)
    }

    pub fn fallback_count(&self) -> usize {
        self.fallback_count.load(Ordering::SeqCst)
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

#[async_trait]
impl EmbeddingProvider for EmbeddingGenerator {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.generate(text).await
    }
}
