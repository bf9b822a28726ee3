pub mod assemble;

pub use assemble::{apply_reranking, paginate};

use std::collections::BTreeSet;
use std::sync::Arc;

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::core::config::ModScoutConfig;
use crate::core::error::Result;
use crate::criteria::StudentCriteria;
use crate::embedding::EmbeddingProvider;
use crate::filter::{filter_modules, FilteredModule};
use crate::rerank::{RerankCandidate, Reranker, RerankerAdapter};
use crate::vector::TopicVectorIndex;

/// Discovery response: one page of criteria-ordered items plus, when a
/// statement was given and the reranker answered, a reranked shortlist.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendResponse {
    pub items: Vec<FilteredModule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reranked_items: Option<Vec<FilteredModule>>,
    pub total_items: usize,
    pub total_pages: usize,
    pub current_page: usize,
    pub page_size: usize,
}

/// Ties the components together: catalog snapshot, whole-catalog topic
/// index, reranker adapter. Stateless per request; safe to share.
pub struct ModScoutEngine {
    catalog: Arc<Catalog>,
    index: TopicVectorIndex,
    reranker: RerankerAdapter,
    config: ModScoutConfig,
}

impl ModScoutEngine {
    pub fn new(
        catalog: Arc<Catalog>,
        embedder: Arc<dyn EmbeddingProvider>,
        reranker: Arc<dyn Reranker>,
        config: ModScoutConfig,
    ) -> Result<Self> {
        // Topics without embeddings cannot take part in similarity search;
        // they remain matchable by exact label.
        let embedded_topics = catalog
            .all_topics()
            .into_iter()
            .filter(|t| t.embedding.is_some())
            .collect();
        let index = TopicVectorIndex::build(
            embedded_topics,
            embedder,
            config.cache_size,
            config.cache_ttl,
        )?;
        let reranker = RerankerAdapter::from_config(reranker, &config);

        Ok(Self {
            catalog,
            index,
            reranker,
            config,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn topic_index(&self) -> &TopicVectorIndex {
        &self.index
    }

    /// The produced interface: filter by criteria, paginate, and when a
    /// free-text statement is present let the reranker order a bounded
    /// candidate set. Reranker silence never fails the request.
    pub async fn recommend(
        &self,
        criteria: &StudentCriteria,
        page: usize,
        size: usize,
        statement: Option<&str>,
    ) -> Result<RecommendResponse> {
        criteria.validate()?;
        let criteria = self.expand_criteria(criteria).await?;

        let rows = filter_modules(&self.catalog, &criteria)?;
        let (items, total_pages) = paginate(&rows, page, size)?;

        let mut reranked_items = None;
        if let Some(statement) = statement.filter(|s| !s.trim().is_empty()) {
            if !rows.is_empty() {
                reranked_items = self.rerank(statement, &rows).await;
            }
        }

        info!(
            "recommend: {} matches, page {}/{}, reranked={}",
            rows.len(),
            page,
            total_pages,
            reranked_items.is_some()
        );

        Ok(RecommendResponse {
            items,
            reranked_items,
            total_items: rows.len(),
            total_pages,
            current_page: page,
            page_size: size,
        })
    }

    /// Replace free-text interest and exclusion topics with their catalog
    /// matches. Both directions go through the same expansion so exclusion
    /// stays consistent with interest.
    async fn expand_criteria(&self, criteria: &StudentCriteria) -> Result<StudentCriteria> {
        let mut expanded = criteria.clone();
        expanded.topics_of_interest = self.expand_topics(&criteria.topics_of_interest).await?;
        expanded.topics_to_exclude = self.expand_topics(&criteria.topics_to_exclude).await?;
        Ok(expanded)
    }

    async fn expand_topics(&self, topics: &BTreeSet<String>) -> Result<BTreeSet<String>> {
        if topics.is_empty() || self.index.is_empty() {
            return Ok(topics.clone());
        }

        let queries = topics.iter().map(|topic| {
            self.index.query(
                topic,
                self.config.topic_expansion_k,
                Some(self.config.topic_expansion_threshold),
            )
        });
        let results = try_join_all(queries).await?;

        let mut expanded = BTreeSet::new();
        for matches in results {
            for topic_match in matches {
                expanded.insert(topic_match.topic.topic);
            }
        }
        debug!("expanded {:?} -> {:?}", topics, expanded);
        Ok(expanded)
    }

    async fn rerank(
        &self,
        statement: &str,
        rows: &[FilteredModule],
    ) -> Option<Vec<FilteredModule>> {
        let bounded = &rows[..rows.len().min(self.config.rerank_candidate_limit)];
        let candidates: Vec<RerankCandidate> = bounded.iter().map(RerankCandidate::from).collect();

        let ranking = self.reranker.rank(statement, &candidates).await;
        if ranking.is_empty() {
            return None;
        }

        let mut reranked = bounded.to_vec();
        apply_reranking(&ranking, &mut reranked);
        reranked.truncate(self.config.rerank_result_limit);
        Some(reranked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::test_fixtures::small_catalog_snapshot;
    use crate::core::error::ModScoutError;
    use crate::embedding::test_support::{FailingEmbedder, StaticEmbedder};
    use crate::rerank::test_support::{ranked, ScriptedReranker, ThrottledReranker};

    fn embedder() -> Arc<StaticEmbedder> {
        Arc::new(StaticEmbedder::new([
            ("Distributed Systems", vec![0.95, 0.08, 0.0]),
            ("geometry", vec![0.05, 0.95, 0.0]),
        ]))
    }

    fn config() -> ModScoutConfig {
        let mut config = ModScoutConfig::default();
        config.topic_expansion_k = 3;
        config.topic_expansion_threshold = 0.3;
        config
    }

    fn engine_with(reranker: Arc<dyn Reranker>) -> ModScoutEngine {
        let catalog = Arc::new(Catalog::new(small_catalog_snapshot()).unwrap());
        ModScoutEngine::new(catalog, embedder(), reranker, config()).unwrap()
    }

    fn engine() -> ModScoutEngine {
        engine_with(Arc::new(ScriptedReranker::new(Vec::new())))
    }

    #[tokio::test]
    async fn test_free_text_topic_expansion() {
        let criteria = StudentCriteria {
            topics_of_interest: ["Distributed Systems".to_string()].into(),
            ..Default::default()
        };
        let response = engine().recommend(&criteria, 1, 10, None).await.unwrap();

        // "Distributed Systems" maps to the catalog labels "Distributed
        // Computing" and "Cloud Systems"; modules tagged with either match.
        let ids: Vec<&str> = response.items.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["IN2259", "IN2300"]);
    }

    #[tokio::test]
    async fn test_exclusion_expanded_like_interest() {
        let criteria = StudentCriteria {
            topics_to_exclude: ["geometry".to_string()].into(),
            ..Default::default()
        };
        let response = engine().recommend(&criteria, 1, 10, None).await.unwrap();
        let ids: Vec<&str> = response.items.iter().map(|m| m.id.as_str()).collect();
        assert!(!ids.contains(&"MA1001"));
        assert_eq!(ids.len(), 3);
    }

    #[tokio::test]
    async fn test_pagination_fields() {
        let response = engine()
            .recommend(&StudentCriteria::default(), 2, 3, None)
            .await
            .unwrap();
        assert_eq!(response.total_items, 4);
        assert_eq!(response.total_pages, 2);
        assert_eq!(response.current_page, 2);
        assert_eq!(response.items.len(), 1);

        let past_end = engine()
            .recommend(&StudentCriteria::default(), 99, 3, None)
            .await
            .unwrap();
        assert!(past_end.items.is_empty());
        assert_eq!(past_end.total_pages, 2);
    }

    #[tokio::test]
    async fn test_reranker_orders_shortlist() {
        let reranker = Arc::new(ScriptedReranker::new(vec![
            ranked("IN2300", "directly about cloud platforms"),
            ranked("IN2259", "foundational for the above"),
        ]));
        let engine = engine_with(reranker);

        let response = engine
            .recommend(&StudentCriteria::default(), 1, 10, Some("I want to build cloud services"))
            .await
            .unwrap();

        let reranked = response.reranked_items.expect("reranked shortlist missing");
        assert_eq!(reranked[0].id, "IN2300");
        assert_eq!(
            reranked[0].reasoning.as_deref(),
            Some("directly about cloud platforms")
        );
        assert_eq!(reranked[1].id, "IN2259");
        // Unmentioned modules follow in original order, without rationale.
        assert_eq!(reranked[2].reasoning, None);

        // The paginated items stay criteria-ordered.
        assert_eq!(response.items[0].id, "IN2259");
    }

    #[tokio::test]
    async fn test_reranker_throttled_falls_back() {
        let engine = engine_with(Arc::new(ThrottledReranker));
        let response = engine
            .recommend(&StudentCriteria::default(), 1, 10, Some("anything"))
            .await
            .unwrap();
        assert!(response.reranked_items.is_none());
        assert_eq!(response.items.len(), 4);
    }

    #[tokio::test]
    async fn test_no_statement_no_rerank_call() {
        let reranker = Arc::new(ScriptedReranker::new(vec![ranked("IN2259", "r")]));
        let engine = engine_with(reranker.clone());
        let response = engine
            .recommend(&StudentCriteria::default(), 1, 10, None)
            .await
            .unwrap();
        assert!(response.reranked_items.is_none());
        assert_eq!(reranker.call_count(), 0);
    }

    #[tokio::test]
    async fn test_embedding_outage_is_hard_error() {
        let catalog = Arc::new(Catalog::new(small_catalog_snapshot()).unwrap());
        let engine = ModScoutEngine::new(
            catalog,
            Arc::new(FailingEmbedder),
            Arc::new(ThrottledReranker),
            config(),
        )
        .unwrap();

        let criteria = StudentCriteria {
            topics_of_interest: ["Distributed Systems".to_string()].into(),
            ..Default::default()
        };
        let err = engine.recommend(&criteria, 1, 10, None).await.unwrap_err();
        assert!(matches!(err, ModScoutError::EmbeddingUnavailable(_)));
    }

    #[tokio::test]
    async fn test_response_serializes_camel_case() {
        let response = engine()
            .recommend(&StudentCriteria::default(), 1, 10, None)
            .await
            .unwrap();
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("totalItems").is_some());
        assert!(json.get("totalPages").is_some());
        assert!(json.get("rerankedItems").is_none());
        let first = &json["items"][0];
        assert!(first.get("prereqModules").is_some());
        assert!(first.get("digitalScore").is_some());
    }
}
