use std::collections::HashMap;

use tracing::debug;

use crate::catalog::{Catalog, Topic};
use crate::core::error::Result;
use crate::vector::TopicVectorIndex;

/// Label used for the combined bucket in a topic-diverse shortlist.
pub const AVERAGE_BUCKET: &str = "avg";

/// Merge several rankings of item indices by average rank.
///
/// Each item's mean 0-based position is taken across only the rankings that
/// contain it, so rankings may cover different item subsets and lengths
/// without normalization and absence is never penalized. Ties keep
/// first-seen order.
pub fn average_rank_aggregation(rankings: &[Vec<usize>]) -> Vec<usize> {
    let mut rank_sums: HashMap<usize, usize> = HashMap::new();
    let mut rank_counts: HashMap<usize, usize> = HashMap::new();
    let mut first_seen: Vec<usize> = Vec::new();

    for ranking in rankings {
        for (rank, &item) in ranking.iter().enumerate() {
            if !rank_counts.contains_key(&item) {
                first_seen.push(item);
            }
            *rank_sums.entry(item).or_default() += rank;
            *rank_counts.entry(item).or_default() += 1;
        }
    }

    let mean = |item: &usize| rank_sums[item] as f64 / rank_counts[item] as f64;
    let mut aggregated = first_seen;
    aggregated.sort_by(|a, b| mean(a).total_cmp(&mean(b)));
    aggregated
}

/// One full topic ranking per topic of interest, by vector distance over
/// the index's topic set.
pub async fn topic_rankings(
    index: &TopicVectorIndex,
    topics_of_interest: &[String],
) -> Result<Vec<Vec<usize>>> {
    let mut rankings = Vec::with_capacity(topics_of_interest.len());
    for topic in topics_of_interest {
        rankings.push(index.query_ranking(topic).await?);
    }
    Ok(rankings)
}

/// Top modules for one interest topic (or the combined average bucket).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortlistBucket {
    pub label: String,
    pub module_ids: Vec<String>,
}

/// Build a topic-diverse shortlist from per-topic rankings over a topic
/// pool: for each interest topic, and once more for the aggregated order,
/// walk topics best-first and collect tagged modules until `per_topic` are
/// found.
pub fn build_shortlist(
    catalog: &Catalog,
    topic_pool: &[Topic],
    topics_of_interest: &[String],
    rankings: &[Vec<usize>],
    per_topic: usize,
) -> Vec<ShortlistBucket> {
    let aggregated = average_rank_aggregation(rankings);
    let mut buckets = Vec::new();

    for (i, ranking) in rankings.iter().chain(std::iter::once(&aggregated)).enumerate() {
        let label = topics_of_interest
            .get(i)
            .map(String::as_str)
            .unwrap_or(AVERAGE_BUCKET);

        let mut module_ids: Vec<String> = Vec::new();
        for &topic_index in ranking {
            let Some(topic) = topic_pool.get(topic_index) else {
                continue;
            };
            for module in catalog.modules_for_topic(topic.topic_id) {
                if module_ids.len() >= per_topic {
                    break;
                }
                if !module_ids.contains(&module.module_id_uni) {
                    module_ids.push(module.module_id_uni.clone());
                }
            }
            if module_ids.len() >= per_topic {
                break;
            }
        }

        debug!("shortlist bucket '{}': {} modules", label, module_ids.len());
        buckets.push(ShortlistBucket {
            label: label.to_string(),
            module_ids,
        });
    }

    buckets
}
