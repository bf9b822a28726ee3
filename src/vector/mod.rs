use std::sync::Arc;

use tracing::debug;

use crate::catalog::Topic;
use crate::core::cache::QueryCache;
use crate::core::error::{ModScoutError, Result};
use crate::embedding::EmbeddingProvider;

/// One nearest-neighbor hit for a queried text. Lives only within a single
/// filter/rank pass.
#[derive(Debug, Clone)]
pub struct TopicMatch {
    pub queried: String,
    pub topic: Topic,
    pub distance: f32,
}

/// Flat L2 nearest-neighbor index over topic embeddings. Read-only after
/// construction; identical queries are memoized for the index lifetime
/// since the embedding call dominates cost.
pub struct TopicVectorIndex {
    topics: Vec<Topic>,
    embeddings: Vec<Vec<f32>>,
    dimension: usize,
    embedder: Arc<dyn EmbeddingProvider>,
    memo: QueryCache<Vec<TopicMatch>>,
}

impl std::fmt::Debug for TopicVectorIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopicVectorIndex")
            .field("topics", &self.topics.len())
            .field("dimension", &self.dimension)
            .finish()
    }
}

impl TopicVectorIndex {
    /// Every topic must carry an embedding, all of one dimensionality.
    pub fn build(
        topics: Vec<Topic>,
        embedder: Arc<dyn EmbeddingProvider>,
        cache_size: usize,
        cache_ttl: u64,
    ) -> Result<Self> {
        let mut embeddings = Vec::with_capacity(topics.len());
        let mut dimension = 0usize;

        for topic in &topics {
            let embedding = topic.embedding.clone().ok_or_else(|| {
                ModScoutError::Catalog(format!("topic '{}' has no embedding", topic.topic))
            })?;
            if dimension == 0 {
                dimension = embedding.len();
            } else if embedding.len() != dimension {
                return Err(ModScoutError::DimensionMismatch {
                    expected: dimension,
                    got: embedding.len(),
                });
            }
            embeddings.push(embedding);
        }

        Ok(Self {
            topics,
            embeddings,
            dimension,
            embedder,
            memo: QueryCache::new(cache_size, cache_ttl),
        })
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    /// The k nearest topics to `text`, best first, optionally cut at
    /// `threshold` (squared L2). An empty index yields an empty result.
    pub async fn query(
        &self,
        text: &str,
        k: usize,
        threshold: Option<f32>,
    ) -> Result<Vec<TopicMatch>> {
        if k == 0 {
            return Err(ModScoutError::InvalidCriteria(
                "vector query requires k >= 1".to_string(),
            ));
        }
        if self.is_empty() {
            return Ok(Vec::new());
        }

        let k_repr = k.to_string();
        let threshold_repr = threshold.map(|t| t.to_bits().to_string()).unwrap_or_default();
        let key = QueryCache::<Vec<TopicMatch>>::make_key(&[text, &k_repr, &threshold_repr]);
        if let Some(cached) = self.memo.get(&key) {
            return Ok(cached);
        }

        let ranked = self.ranked_distances(text).await?;
        let matches: Vec<TopicMatch> = ranked
            .into_iter()
            .take(k)
            .filter(|(_, distance)| threshold.is_none_or(|t| *distance <= t))
            .map(|(index, distance)| TopicMatch {
                queried: text.to_string(),
                topic: self.topics[index].clone(),
                distance,
            })
            .collect();

        debug!("Vector query '{}' (k={}): {} matches", text, k, matches.len());
        self.memo.set(&key, matches.clone());
        Ok(matches)
    }

    /// Full ordering of all topic indices by distance to `text`, used by
    /// the rank aggregator.
    pub async fn query_ranking(&self, text: &str) -> Result<Vec<usize>> {
        let ranked = self.ranked_distances(text).await?;
        Ok(ranked.into_iter().map(|(index, _)| index).collect())
    }

    /// Expand several free-text topics into catalog matches, preserving
    /// input order.
    pub async fn map_topics(
        &self,
        texts: &[String],
        k: usize,
        threshold: Option<f32>,
    ) -> Result<Vec<(String, Vec<TopicMatch>)>> {
        let mut mappings = Vec::with_capacity(texts.len());
        for text in texts {
            let matches = self.query(text, k, threshold).await?;
            mappings.push((text.clone(), matches));
        }
        Ok(mappings)
    }

    pub fn clear_memo(&self) {
        self.memo.clear();
    }

    async fn ranked_distances(&self, text: &str) -> Result<Vec<(usize, f32)>> {
        let query = self
            .embedder
            .embed(text)
            .await
            .map_err(|e| ModScoutError::EmbeddingUnavailable(e.to_string()))?;
        if query.len() != self.dimension {
            return Err(ModScoutError::DimensionMismatch {
                expected: self.dimension,
                got: query.len(),
            });
        }

        let mut ranked: Vec<(usize, f32)> = self
            .embeddings
            .iter()
            .enumerate()
            .map(|(index, embedding)| (index, l2_sq(&query, embedding)))
            .collect();
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        Ok(ranked)
    }
}

/// Squared L2 distance. Monotone in true L2, so ordering and thresholds
/// behave identically without the sqrt.
fn l2_sq(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::test_fixtures::topic;
    use crate::embedding::test_support::{FailingEmbedder, StaticEmbedder};

    fn test_index() -> TopicVectorIndex {
        let topics = vec![
            topic(1, "Distributed Computing", [1.0, 0.0, 0.0]),
            topic(2, "Cloud Systems", [0.9, 0.1, 0.0]),
            topic(3, "Affine Geometry", [0.0, 1.0, 0.0]),
            topic(4, "Machine Learning", [0.0, 0.0, 1.0]),
        ];
        let embedder = Arc::new(StaticEmbedder::new([
            ("Distributed Systems", vec![0.95, 0.08, 0.0]),
            ("geometry", vec![0.0, 0.9, 0.1]),
        ]));
        TopicVectorIndex::build(topics, embedder, 100, 300).unwrap()
    }

    #[test]
    fn test_build_rejects_dimension_mismatch() {
        let topics = vec![
            topic(1, "A", [1.0, 0.0, 0.0]),
            Topic {
                topic_id: 2,
                topic: "B".to_string(),
                embedding: Some(vec![1.0, 0.0]),
            },
        ];
        let err = TopicVectorIndex::build(topics, Arc::new(FailingEmbedder), 10, 60).unwrap_err();
        assert!(matches!(
            err,
            ModScoutError::DimensionMismatch { expected: 3, got: 2 }
        ));
    }

    #[test]
    fn test_build_rejects_missing_embedding() {
        let topics = vec![Topic {
            topic_id: 1,
            topic: "A".to_string(),
            embedding: None,
        }];
        let err = TopicVectorIndex::build(topics, Arc::new(FailingEmbedder), 10, 60).unwrap_err();
        assert!(matches!(err, ModScoutError::Catalog(_)));
    }

    #[tokio::test]
    async fn test_query_nearest_first() {
        let index = test_index();
        let matches = index.query("Distributed Systems", 2, None).await.unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].topic.topic, "Cloud Systems");
        assert_eq!(matches[1].topic.topic, "Distributed Computing");
        assert!(matches[0].distance <= matches[1].distance);
    }

    #[tokio::test]
    async fn test_threshold_cuts_far_matches() {
        let index = test_index();
        let matches = index.query("Distributed Systems", 4, Some(0.3)).await.unwrap();
        let labels: Vec<&str> = matches.iter().map(|m| m.topic.topic.as_str()).collect();
        assert_eq!(labels, vec!["Cloud Systems", "Distributed Computing"]);
    }

    #[tokio::test]
    async fn test_threshold_monotonicity() {
        let index = test_index();
        let tight = index.query("Distributed Systems", 4, Some(0.1)).await.unwrap();
        let loose = index.query("Distributed Systems", 4, Some(2.0)).await.unwrap();
        assert!(tight.len() <= loose.len());
        let loose_labels: Vec<&str> = loose.iter().map(|m| m.topic.topic.as_str()).collect();
        for m in &tight {
            assert!(loose_labels.contains(&m.topic.topic.as_str()));
        }
    }

    #[tokio::test]
    async fn test_identical_queries_memoized() {
        let topics = vec![topic(1, "A", [1.0, 0.0, 0.0])];
        let embedder = Arc::new(StaticEmbedder::new([("q", vec![1.0, 0.0, 0.0])]));
        let index = TopicVectorIndex::build(topics, embedder.clone(), 100, 300).unwrap();

        index.query("q", 1, None).await.unwrap();
        index.query("q", 1, None).await.unwrap();
        index.query("q", 1, None).await.unwrap();
        assert_eq!(embedder.call_count(), 1);

        // Different k is a different query tuple.
        index.query("q", 2, None).await.unwrap();
        assert_eq!(embedder.call_count(), 2);
    }

    #[tokio::test]
    async fn test_empty_index_returns_empty() {
        let index =
            TopicVectorIndex::build(Vec::new(), Arc::new(FailingEmbedder), 10, 60).unwrap();
        let matches = index.query("anything", 3, None).await.unwrap();
        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn test_zero_k_rejected() {
        let index = test_index();
        let err = index.query("Distributed Systems", 0, None).await.unwrap_err();
        assert!(matches!(err, ModScoutError::InvalidCriteria(_)));
    }

    #[tokio::test]
    async fn test_embedding_failure_is_hard_error() {
        let topics = vec![topic(1, "A", [1.0, 0.0, 0.0])];
        let index = TopicVectorIndex::build(topics, Arc::new(FailingEmbedder), 10, 60).unwrap();
        let err = index.query("q", 1, None).await.unwrap_err();
        assert!(matches!(err, ModScoutError::EmbeddingUnavailable(_)));
    }

    #[test]
    fn test_debug_summarizes_index() {
        let repr = format!("{:?}", test_index());
        assert!(repr.contains("TopicVectorIndex"));
        assert!(repr.contains("dimension"));
    }

    #[tokio::test]
    async fn test_query_ranking_orders_all_topics() {
        let index = test_index();
        let ranking = index.query_ranking("geometry").await.unwrap();
        assert_eq!(ranking.len(), 4);
        assert_eq!(ranking[0], 2); // Affine Geometry
    }
}
