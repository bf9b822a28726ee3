use std::collections::HashMap;

use crate::core::error::{ModScoutError, Result};
use crate::filter::FilteredModule;
use crate::rerank::RankedModule;

/// Slice out one page, 1-based. A page past the end is an empty slice, not
/// an error. Returns the page items and the total page count.
pub fn paginate<T: Clone>(items: &[T], page: usize, size: usize) -> Result<(Vec<T>, usize)> {
    if page < 1 {
        return Err(ModScoutError::InvalidCriteria("page must be >= 1".to_string()));
    }
    if size < 1 {
        return Err(ModScoutError::InvalidCriteria("page size must be >= 1".to_string()));
    }

    let total_pages = items.len().div_ceil(size);
    let start = (page - 1) * size;
    let page_items = if start >= items.len() {
        Vec::new()
    } else {
        items[start..(start + size).min(items.len())].to_vec()
    };
    Ok((page_items, total_pages))
}

/// Reorder modules to a reranked order and attach rationales. Modules the
/// reranker did not mention keep their relative order after the ranked
/// ones, with no rationale.
pub fn apply_reranking(ranking: &[RankedModule], modules: &mut [FilteredModule]) {
    let order: HashMap<&str, usize> = ranking
        .iter()
        .enumerate()
        .map(|(position, ranked)| (ranked.module_id.as_str(), position))
        .collect();
    let reasoning: HashMap<&str, &str> = ranking
        .iter()
        .map(|ranked| (ranked.module_id.as_str(), ranked.reasoning.as_str()))
        .collect();

    modules.sort_by_key(|m| order.get(m.id.as_str()).copied().unwrap_or(usize::MAX));
    for module in modules.iter_mut() {
        module.reasoning = reasoning.get(module.id.as_str()).map(|r| r.to_string());
    }
}
