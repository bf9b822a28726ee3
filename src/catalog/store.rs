use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::error::{ModScoutError, Result};

use super::models::{
    Module, ModulePrerequisiteMapping, ModuleSummary, ModuleTopicMapping, Organisation, Topic,
};
use super::title_match;

/// Serialized catalog snapshot as produced by the offline population jobs.
#[derive(Debug, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub modules: Vec<Module>,
    pub organisations: Vec<Organisation>,
    pub topics: Vec<Topic>,
    pub module_topics: Vec<ModuleTopicMapping>,
    pub module_prerequisites: Vec<ModulePrerequisiteMapping>,
}

/// Read-only catalog loaded once per process. Validates referential
/// integrity of both mapping tables and the organisation forest at load
/// time; all later access is lock-free.
#[derive(Debug)]
pub struct Catalog {
    modules: Vec<Module>,
    organisations: HashMap<String, Organisation>,
    topics: HashMap<u64, Topic>,
    topics_by_module: HashMap<u64, Vec<u64>>,
    prereqs_by_module: HashMap<String, Vec<ModulePrerequisiteMapping>>,
    module_idx_by_uni: HashMap<String, usize>,
    org_id_by_name: HashMap<String, String>,
}

impl Catalog {
    pub fn new(snapshot: CatalogSnapshot) -> Result<Self> {
        let CatalogSnapshot {
            modules,
            organisations,
            topics,
            module_topics,
            module_prerequisites,
        } = snapshot;

        let mut org_map: HashMap<String, Organisation> = HashMap::new();
        let mut org_id_by_name = HashMap::new();
        for org in organisations {
            org_id_by_name.insert(org.name.clone(), org.org_id.clone());
            if org_map.insert(org.org_id.clone(), org).is_some() {
                return Err(ModScoutError::Catalog("duplicate organisation id".into()));
            }
        }
        Self::check_org_links(&org_map)?;

        let mut module_idx_by_uni = HashMap::new();
        let mut module_ids = HashSet::new();
        for (idx, module) in modules.iter().enumerate() {
            if !module_ids.insert(module.module_id) {
                return Err(ModScoutError::Catalog(format!(
                    "duplicate module id {}",
                    module.module_id
                )));
            }
            if module_idx_by_uni
                .insert(module.module_id_uni.clone(), idx)
                .is_some()
            {
                return Err(ModScoutError::Catalog(format!(
                    "duplicate module uni id {}",
                    module.module_id_uni
                )));
            }
            if let Some(org_id) = &module.org_id {
                if !org_map.contains_key(org_id) {
                    return Err(ModScoutError::Catalog(format!(
                        "module {} references unknown organisation {}",
                        module.module_id_uni, org_id
                    )));
                }
            }
        }

        let mut topic_map = HashMap::new();
        for topic in topics {
            if topic_map.insert(topic.topic_id, topic).is_some() {
                return Err(ModScoutError::Catalog("duplicate topic id".into()));
            }
        }

        let mut topics_by_module: HashMap<u64, Vec<u64>> = HashMap::new();
        for mapping in &module_topics {
            if !module_ids.contains(&mapping.module_id) {
                return Err(ModScoutError::Catalog(format!(
                    "topic mapping references unknown module {}",
                    mapping.module_id
                )));
            }
            if !topic_map.contains_key(&mapping.topic_id) {
                return Err(ModScoutError::Catalog(format!(
                    "topic mapping references unknown topic {}",
                    mapping.topic_id
                )));
            }
            let entry = topics_by_module.entry(mapping.module_id).or_default();
            if !entry.contains(&mapping.topic_id) {
                entry.push(mapping.topic_id);
            }
        }

        let mut prereqs_by_module: HashMap<String, Vec<ModulePrerequisiteMapping>> = HashMap::new();
        for mapping in module_prerequisites {
            if !module_idx_by_uni.contains_key(&mapping.module_id_uni) {
                return Err(ModScoutError::Catalog(format!(
                    "prerequisite mapping references unknown module {}",
                    mapping.module_id_uni
                )));
            }
            if !module_idx_by_uni.contains_key(&mapping.prereq_module_id_uni) {
                return Err(ModScoutError::Catalog(format!(
                    "prerequisite mapping references unknown module {}",
                    mapping.prereq_module_id_uni
                )));
            }
            prereqs_by_module
                .entry(mapping.module_id_uni.clone())
                .or_default()
                .push(mapping);
        }

        info!(
            "Catalog loaded: {} modules, {} organisations, {} topics",
            modules.len(),
            org_map.len(),
            topic_map.len()
        );

        Ok(Self {
            modules,
            organisations: org_map,
            topics: topic_map,
            topics_by_module,
            prereqs_by_module,
            module_idx_by_uni,
            org_id_by_name,
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: CatalogSnapshot = serde_json::from_str(json)?;
        Self::new(snapshot)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Organisation links are stored as a flat id-keyed forest. Rejects
    /// cycles in the parent chain and dangling dep/school references.
    fn check_org_links(orgs: &HashMap<String, Organisation>) -> Result<()> {
        for org in orgs.values() {
            for link in [&org.parent_org_id, &org.dep_id, &org.school_id]
                .into_iter()
                .flatten()
            {
                if !orgs.contains_key(link) {
                    return Err(ModScoutError::Catalog(format!(
                        "organisation {} references unknown organisation {}",
                        org.org_id, link
                    )));
                }
            }

            let mut visited = HashSet::new();
            let mut current = Some(&org.org_id);
            while let Some(id) = current {
                if !visited.insert(id.clone()) {
                    return Err(ModScoutError::Catalog(format!(
                        "organisation hierarchy cycle at {}",
                        id
                    )));
                }
                current = orgs.get(id).and_then(|o| o.parent_org_id.as_ref());
            }
        }
        Ok(())
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn module_by_uni_id(&self, uni_id: &str) -> Option<&Module> {
        self.module_idx_by_uni.get(uni_id).map(|&i| &self.modules[i])
    }

    pub fn organisation(&self, org_id: &str) -> Option<&Organisation> {
        self.organisations.get(org_id)
    }

    pub fn org_id_by_name(&self, name: &str) -> Option<&str> {
        self.org_id_by_name.get(name).map(String::as_str)
    }

    pub fn topic(&self, topic_id: u64) -> Option<&Topic> {
        self.topics.get(&topic_id)
    }

    /// Distinct topic labels on a module, sorted for stable output rows.
    pub fn topic_labels(&self, module_id: u64) -> Vec<String> {
        let mut labels: Vec<String> = self
            .topics_by_module
            .get(&module_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.topics.get(id))
                    .map(|t| t.topic.clone())
                    .collect()
            })
            .unwrap_or_default();
        labels.sort();
        labels
    }

    pub fn prerequisites(&self, module_id_uni: &str) -> &[ModulePrerequisiteMapping] {
        self.prereqs_by_module
            .get(module_id_uni)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn prerequisite_ids(&self, module_id_uni: &str) -> Vec<String> {
        let mut ids: Vec<String> = self
            .prerequisites(module_id_uni)
            .iter()
            .map(|p| p.prereq_module_id_uni.clone())
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    /// Distinct topics over a module pool, e.g. the candidate set of a
    /// filter pass. Order follows topic ids for determinism.
    pub fn distinct_topics(&self, module_ids: &[u64]) -> Vec<Topic> {
        let mut seen = HashSet::new();
        let mut result = Vec::new();
        for module_id in module_ids {
            if let Some(topic_ids) = self.topics_by_module.get(module_id) {
                for topic_id in topic_ids {
                    if seen.insert(*topic_id) {
                        if let Some(topic) = self.topics.get(topic_id) {
                            result.push(topic.clone());
                        }
                    }
                }
            }
        }
        result.sort_by_key(|t| t.topic_id);
        result
    }

    /// Modules tagged with `topic_id`, in catalog order.
    pub fn modules_for_topic(&self, topic_id: u64) -> Vec<&Module> {
        self.modules
            .iter()
            .filter(|m| {
                self.topics_by_module
                    .get(&m.module_id)
                    .is_some_and(|ids| ids.contains(&topic_id))
            })
            .collect()
    }

    pub fn all_topics(&self) -> Vec<Topic> {
        let mut topics: Vec<Topic> = self.topics.values().cloned().collect();
        topics.sort_by_key(|t| t.topic_id);
        topics
    }

    pub fn modules_by_id(&self, uni_ids: &[String]) -> Vec<ModuleSummary> {
        uni_ids
            .iter()
            .filter_map(|id| self.module_by_uni_id(id))
            .map(|m| ModuleSummary {
                id: m.module_id_uni.clone(),
                title: m.name.clone(),
            })
            .collect()
    }

    /// Case-insensitive substring search over uni id and name.
    pub fn search_modules(&self, query: &str, limit: usize) -> Vec<ModuleSummary> {
        if query.is_empty() {
            return Vec::new();
        }
        let needle = query.to_lowercase();
        self.modules
            .iter()
            .filter(|m| {
                m.module_id_uni.to_lowercase().contains(&needle)
                    || m.name.to_lowercase().contains(&needle)
            })
            .take(limit)
            .map(|m| ModuleSummary {
                id: m.module_id_uni.clone(),
                title: m.name.clone(),
            })
            .collect()
    }

    /// Match free-text course titles (as extracted from a student statement)
    /// onto catalog modules. Picks the best-scoring title above the cutoff;
    /// sequel suffixes ("Analysis II" for "Analysis I") are penalized so a
    /// completed course does not match its follow-up.
    pub fn match_previous_titles(&self, titles: &[String]) -> Vec<ModuleSummary> {
        let mut matched = Vec::new();
        for title in titles {
            let mut best: Option<(f64, &Module)> = None;
            for module in &self.modules {
                let score = title_match::similarity_score(title, &module.name);
                if score > title_match::MATCH_CUTOFF
                    && best.is_none_or(|(best_score, _)| score > best_score)
                {
                    best = Some((score, module));
                }
            }
            if let Some((_, module)) = best {
                matched.push(ModuleSummary {
                    id: module.module_id_uni.clone(),
                    title: module.name.clone(),
                });
            }
        }
        matched
    }
}
