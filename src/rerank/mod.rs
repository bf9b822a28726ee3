use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::core::cache::QueryCache;
use crate::core::config::ModScoutConfig;
use crate::filter::FilteredModule;

#[derive(Error, Debug)]
pub enum RerankerError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Rate limited")]
    RateLimited,

    #[error("Provider error: {0}")]
    Provider(String),
}

/// One ranked candidate with a short rationale for its position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedModule {
    pub module_id: String,
    pub reasoning: String,
}

/// The salient module fields the reranker sees. Order-insensitive as a set;
/// the adapter derives an order-independent cache key from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankCandidate {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub prereq: Option<String>,
    pub ects: Option<i64>,
    pub language: Option<String>,
    pub study_level: Option<String>,
    pub chair: Option<String>,
    pub department: Option<String>,
    pub school: Option<String>,
}

impl From<&FilteredModule> for RerankCandidate {
    fn from(module: &FilteredModule) -> Self {
        Self {
            id: module.id.clone(),
            title: module.title.clone(),
            description: module.description.clone(),
            prereq: module.prereq.clone(),
            ects: module.ects,
            language: module.language.clone(),
            study_level: module.study_level.clone(),
            chair: module.chair.clone(),
            department: module.department.clone(),
            school: module.school.clone(),
        }
    }
}

/// External free-text relevance ranker. Implementations may rank any subset
/// of the candidates; an empty ordering means "no opinion".
#[async_trait]
pub trait Reranker: Send + Sync {
    async fn rank(
        &self,
        statement: &str,
        candidates: &[RerankCandidate],
    ) -> Result<Vec<RankedModule>, RerankerError>;
}

/// Wraps a [`Reranker`] with response caching, a concurrency bound and a
/// timeout. Every failure mode degrades to an empty ordering; reranking is
/// best-effort and never fails a discovery request.
pub struct RerankerAdapter {
    inner: Arc<dyn Reranker>,
    cache: QueryCache<Vec<RankedModule>>,
    semaphore: Arc<Semaphore>,
    timeout: Duration,
}

impl RerankerAdapter {
    pub fn new(
        inner: Arc<dyn Reranker>,
        cache_size: usize,
        cache_ttl: u64,
        max_concurrency: usize,
        timeout_secs: u64,
    ) -> Self {
        Self {
            inner,
            cache: QueryCache::new(cache_size, cache_ttl),
            semaphore: Arc::new(Semaphore::new(max_concurrency.max(1))),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub fn from_config(inner: Arc<dyn Reranker>, config: &ModScoutConfig) -> Self {
        Self::new(
            inner,
            config.cache_size,
            config.cache_ttl,
            config.reranker_max_concurrency,
            config.reranker_timeout,
        )
    }

    /// Rank `candidates` against the student's statement. Infallible:
    /// timeouts, throttling and provider errors all yield an empty order.
    pub async fn rank(
        &self,
        statement: &str,
        candidates: &[RerankCandidate],
    ) -> Vec<RankedModule> {
        if statement.trim().is_empty() || candidates.is_empty() {
            return Vec::new();
        }

        let key = Self::cache_key(statement, candidates);
        if let Some(cached) = self.cache.get(&key) {
            debug!("Reranker cache hit");
            return cached;
        }

        let permit = match self.semaphore.acquire().await {
            Ok(permit) => permit,
            Err(_) => return Vec::new(),
        };
        let result = tokio::time::timeout(self.timeout, self.inner.rank(statement, candidates)).await;
        drop(permit);

        let ranking = match result {
            Ok(Ok(ranking)) => ranking,
            Ok(Err(e)) => {
                warn!("Reranker unavailable, serving unranked order: {}", e);
                Vec::new()
            }
            Err(_) => {
                warn!("Reranker timed out after {:?}, serving unranked order", self.timeout);
                Vec::new()
            }
        };

        self.cache.set(&key, ranking.clone());
        ranking
    }

    /// Candidate sets are order-insensitive: sort the ids before hashing so
    /// permutations of one set share a cache entry.
    fn cache_key(statement: &str, candidates: &[RerankCandidate]) -> String {
        let mut ids: Vec<&str> = candidates.iter().map(|c| c.id.as_str()).collect();
        ids.sort_unstable();
        let mut parts = vec![statement];
        parts.extend(ids);
        QueryCache::<Vec<RankedModule>>::make_key(&parts)
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

const RERANK_SYSTEM_PROMPT: &str = "You are a helpful tutor at the help office of a university. \
You will be provided with a list of course modules containing fields such as module id, \
description, language, etc. Also, you will be provided with a message from a student. \
Rank the modules according to the student's message, best match first, and give a short \
reason for each module. Respond as JSON: \
{\"ranked_modules\": [{\"module_id\": \"...\", \"reasoning\": \"...\"}]}";

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    temperature: f32,
    messages: Vec<ChatMessage>,
    response_format: serde_json::Value,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct ModuleRankings {
    ranked_modules: Vec<RankedModule>,
}

/// OpenAI-compatible chat-completions reranker.
pub struct OpenAiReranker {
    model: String,
    api_key: String,
    base_url: String,
    client: Client,
}

impl OpenAiReranker {
    pub fn new(
        model: impl Into<String>,
        api_key: impl Into<String>,
        base_url: Option<String>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            model: model.into(),
            api_key: api_key.into(),
            base_url: base_url
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
        }
    }
}

#[async_trait]
impl Reranker for OpenAiReranker {
    async fn rank(
        &self,
        statement: &str,
        candidates: &[RerankCandidate],
    ) -> Result<Vec<RankedModule>, RerankerError> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            temperature: 0.0,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: RERANK_SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: format!("Student input: {statement}"),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: format!("Modules:\n{}", serde_json::to_string(candidates)?),
                },
            ],
            response_format: serde_json::json!({"type": "json_object"}),
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(RerankerError::RateLimited);
        }
        let response = response
            .error_for_status()
            .map_err(RerankerError::Http)?
            .json::<ChatCompletionResponse>()
            .await?;

        let content = response
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| RerankerError::Provider("empty completion".to_string()))?;
        let rankings: ModuleRankings = serde_json::from_str(content)?;
        Ok(rankings.ranked_modules)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    fn adapter(inner: Arc<dyn Reranker>) -> RerankerAdapter {
        RerankerAdapter::new(inner, 100, 300, 2, 5)
    }

    #[tokio::test]
    async fn test_ranking_passthrough() {
        let inner = Arc::new(ScriptedReranker::new(vec![ranked("B", "best fit")]));
        let adapter = adapter(inner);
        let result = adapter
            .rank("something distributed", &[candidate("A"), candidate("B")])
            .await;
        assert_eq!(result, vec![ranked("B", "best fit")]);
    }

    #[tokio::test]
    async fn test_identical_requests_cached() {
        let inner = Arc::new(ScriptedReranker::new(vec![ranked("A", "r")]));
        let adapter = RerankerAdapter::new(inner.clone(), 100, 300, 2, 5);

        adapter.rank("stmt", &[candidate("A"), candidate("B")]).await;
        adapter.rank("stmt", &[candidate("A"), candidate("B")]).await;
        assert_eq!(inner.call_count(), 1);
    }

    #[tokio::test]
    async fn test_candidate_order_does_not_matter() {
        let inner = Arc::new(ScriptedReranker::new(vec![ranked("A", "r")]));
        let adapter = RerankerAdapter::new(inner.clone(), 100, 300, 2, 5);

        adapter.rank("stmt", &[candidate("A"), candidate("B")]).await;
        adapter.rank("stmt", &[candidate("B"), candidate("A")]).await;
        assert_eq!(inner.call_count(), 1);
    }

    #[tokio::test]
    async fn test_throttling_degrades_to_empty() {
        let adapter = adapter(Arc::new(ThrottledReranker));
        let result = adapter.rank("stmt", &[candidate("A")]).await;
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_timeout_degrades_to_empty() {
        let mut inner = ScriptedReranker::new(vec![ranked("A", "r")]);
        inner.delay = Some(Duration::from_secs(60));
        let adapter = RerankerAdapter::new(Arc::new(inner), 100, 300, 2, 0);
        let result = adapter.rank("stmt", &[candidate("A")]).await;
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_empty_statement_or_candidates_skip_call() {
        let inner = Arc::new(ScriptedReranker::new(vec![ranked("A", "r")]));
        let adapter = RerankerAdapter::new(inner.clone(), 100, 300, 2, 5);

        assert!(adapter.rank("  ", &[candidate("A")]).await.is_empty());
        assert!(adapter.rank("stmt", &[]).await.is_empty());
        assert_eq!(inner.call_count(), 0);
    }
}
