use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::{Catalog, Module};
use crate::core::error::{ModScoutError, Result};
use crate::criteria::mapping::{ModuleLanguage, LANG_UNKNOWN, LEVEL_UNKNOWN};
use crate::criteria::StudentCriteria;

/// One result row: module fields plus resolved organisation names, topic
/// labels and prerequisite ids. `reasoning` stays None until the assembler
/// attaches a reranker rationale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteredModule {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub prereq: Option<String>,
    pub digital_score: Option<i64>,
    pub ects: Option<i64>,
    pub language: Option<String>,
    pub study_level: Option<String>,
    pub org_id: Option<String>,
    pub chair: Option<String>,
    pub department: Option<String>,
    pub school: Option<String>,
    pub topics: Vec<String>,
    pub prereq_modules: Vec<String>,
    pub reasoning: Option<String>,
}

/// A module with its joined associations, as seen by the predicates.
/// School and department come from the owning organisation's denormalized
/// references, so no predicate ever walks the hierarchy.
struct Candidate<'a> {
    module: &'a Module,
    topics: Vec<String>,
    prereq_ids: Vec<String>,
    school_org_id: Option<String>,
    dep_org_id: Option<String>,
}

type Predicate<'a> = Box<dyn Fn(&Candidate) -> bool + 'a>;

/// Two-group predicate builder. Strict predicates AND together; relaxed
/// predicates OR against that conjunction, so a module the student is
/// already qualified for survives failing the other filters:
/// `OR(AND(strict...), relaxed...)`.
struct PredicateSet<'a> {
    strict: Vec<Predicate<'a>>,
    relaxed: Vec<Predicate<'a>>,
}

impl<'a> PredicateSet<'a> {
    fn new() -> Self {
        Self {
            strict: Vec::new(),
            relaxed: Vec::new(),
        }
    }

    fn strict(&mut self, predicate: impl Fn(&Candidate) -> bool + 'a) {
        self.strict.push(Box::new(predicate));
    }

    fn relaxed(&mut self, predicate: impl Fn(&Candidate) -> bool + 'a) {
        self.relaxed.push(Box::new(predicate));
    }

    fn matches(&self, candidate: &Candidate) -> bool {
        self.strict.iter().all(|p| p(candidate)) || self.relaxed.iter().any(|p| p(candidate))
    }
}

fn compile<'a>(catalog: &Catalog, criteria: &'a StudentCriteria) -> Result<PredicateSet<'a>> {
    let mut predicates = PredicateSet::new();

    if !criteria.languages.is_empty() {
        let accepted = ModuleLanguage::widen(&criteria.languages);
        debug!("filter (language): {:?}", accepted);
        predicates.strict(move |c| {
            accepted.contains(c.module.lang.as_deref().unwrap_or(LANG_UNKNOWN))
        });
    }

    if let Some(level) = criteria.study_level {
        let accepted = level.widen();
        debug!("filter (level): {:?}", accepted);
        predicates.strict(move |c| {
            accepted.contains(c.module.level.as_deref().unwrap_or(LEVEL_UNKNOWN))
        });
    }

    if let Some(min) = criteria.ects_min {
        predicates.strict(move |c| c.module.ects.is_some_and(|e| e >= min));
    }
    if let Some(max) = criteria.ects_max {
        predicates.strict(move |c| c.module.ects.is_some_and(|e| e <= max));
    }

    // Digital score stays strict; it never participates in the relaxed
    // previous-modules branch.
    if let Some(min) = criteria.digital_score_min {
        predicates.strict(move |c| c.module.digital_score.is_some_and(|s| s >= min));
    }
    if let Some(max) = criteria.digital_score_max {
        predicates.strict(move |c| c.module.digital_score.is_some_and(|s| s <= max));
    }

    if !criteria.schools.is_empty() {
        let mut school_ids = BTreeSet::new();
        for school in &criteria.schools {
            let org_id = catalog.org_id_by_name(&school.to_string()).ok_or_else(|| {
                ModScoutError::InvalidCriteria(format!("school not in catalog: {school}"))
            })?;
            school_ids.insert(org_id.to_string());
        }
        predicates.strict(move |c| {
            c.school_org_id
                .as_ref()
                .is_some_and(|id| school_ids.contains(id))
        });
    }

    if !criteria.departments.is_empty() {
        let mut department_ids = BTreeSet::new();
        for department in &criteria.departments {
            let org_id = catalog
                .org_id_by_name(&department.to_string())
                .ok_or_else(|| {
                    ModScoutError::InvalidCriteria(format!(
                        "department not in catalog: {department}"
                    ))
                })?;
            department_ids.insert(org_id.to_string());
        }
        predicates.strict(move |c| {
            c.dep_org_id
                .as_ref()
                .is_some_and(|id| department_ids.contains(id))
        });
    }

    if !criteria.topics_of_interest.is_empty() {
        let wanted = &criteria.topics_of_interest;
        predicates.strict(move |c| c.topics.iter().any(|t| wanted.contains(t)));
    }

    if !criteria.topics_to_exclude.is_empty() {
        let excluded = &criteria.topics_to_exclude;
        predicates.strict(move |c| !c.topics.iter().any(|t| excluded.contains(t)));
    }

    if !criteria.previous_modules.is_empty() {
        let completed = &criteria.previous_modules;
        predicates.relaxed(move |c| c.prereq_ids.iter().any(|id| completed.contains(id)));
    }

    Ok(predicates)
}

/// Apply the compiled criteria to the catalog and return one augmented row
/// per matching module. An empty result is a normal outcome.
pub fn filter_modules(
    catalog: &Catalog,
    criteria: &StudentCriteria,
) -> Result<Vec<FilteredModule>> {
    criteria.validate()?;
    let predicates = compile(catalog, criteria)?;

    let mut rows = Vec::new();
    for module in catalog.modules() {
        let topics = catalog.topic_labels(module.module_id);
        // Topic tagging is mandatory: an untagged module cannot take part
        // in topic-based discovery.
        if topics.is_empty() {
            continue;
        }
        let prereq_ids = catalog.prerequisite_ids(&module.module_id_uni);

        let organisation = module
            .org_id
            .as_deref()
            .and_then(|id| catalog.organisation(id));
        let candidate = Candidate {
            module,
            topics,
            prereq_ids,
            school_org_id: organisation.and_then(|o| o.school_id.clone()),
            dep_org_id: organisation.and_then(|o| o.dep_id.clone()),
        };

        if !predicates.matches(&candidate) {
            continue;
        }

        let department = candidate
            .dep_org_id
            .as_deref()
            .and_then(|id| catalog.organisation(id))
            .map(|o| o.name.clone());
        let school = candidate
            .school_org_id
            .as_deref()
            .and_then(|id| catalog.organisation(id))
            .map(|o| o.name.clone());

        rows.push(FilteredModule {
            id: module.module_id_uni.clone(),
            title: module.name.clone(),
            description: module.description.clone(),
            prereq: module.prereq.clone(),
            digital_score: module.digital_score,
            ects: module.ects,
            language: module.lang.clone(),
            study_level: module.level.clone(),
            org_id: module.org_id.clone(),
            chair: organisation.map(|o| o.name.clone()),
            department,
            school,
            topics: candidate.topics,
            prereq_modules: candidate.prereq_ids,
            reasoning: None,
        });
    }

    order_by_relevance(&mut rows, criteria);

    info!("filter: {} of {} modules match", rows.len(), catalog.modules().len());
    Ok(rows)
}

/// Primary key: matched interest topics (desc). Secondary: matched completed
/// prerequisites (desc). Stable beyond that.
fn order_by_relevance(rows: &mut [FilteredModule], criteria: &StudentCriteria) {
    if criteria.topics_of_interest.is_empty() && criteria.previous_modules.is_empty() {
        return;
    }
    rows.sort_by_key(|row| {
        let topic_hits = row
            .topics
            .iter()
            .filter(|t| criteria.topics_of_interest.contains(*t))
            .count();
        let prereq_hits = row
            .prereq_modules
            .iter()
            .filter(|id| criteria.previous_modules.contains(*id))
            .count();
        (std::cmp::Reverse(topic_hits), std::cmp::Reverse(prereq_hits))
    });
}
