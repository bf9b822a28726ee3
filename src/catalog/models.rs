use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A single course offering. Authored offline, immutable per query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub module_id: u64,
    /// University-facing identifier, e.g. "IN2259". Unique.
    pub module_id_uni: String,
    pub name: String,
    pub org_id: Option<String>,
    pub level: Option<String>,
    pub lang: Option<String>,
    pub ects: Option<i64>,
    pub prereq: Option<String>,
    pub description: Option<String>,
    pub digital_score: Option<i64>,
    pub valid_from: Option<NaiveDate>,
    pub valid_to: Option<NaiveDate>,
    pub link: Option<String>,
}

impl Module {
    /// Whether the module is offered on `date`. Open bounds never exclude.
    pub fn is_valid_on(&self, date: NaiveDate) -> bool {
        if let Some(from) = self.valid_from {
            if date < from {
                return false;
            }
        }
        if let Some(to) = self.valid_to {
            if date > to {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrgType {
    School,
    Department,
    Chair,
    Administration,
    Clinic,
    FormerFacility,
    Unclassified,
}

/// One node of the organisation forest. `dep_id` and `school_id` are
/// denormalized weak references so chair/department/school resolution never
/// walks the parent chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organisation {
    pub org_id: String,
    pub name: String,
    pub org_type: OrgType,
    pub parent_org_id: Option<String>,
    pub dep_id: Option<String>,
    pub school_id: Option<String>,
}

/// A semantic label attached to modules, backed by an embedding vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    pub topic_id: u64,
    pub topic: String,
    pub embedding: Option<Vec<f32>>,
}

/// Unordered Module x Topic association.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleTopicMapping {
    pub module_id: u64,
    pub topic_id: u64,
}

/// Directed prerequisite edge between modules, keyed by university ids.
/// `score` is None when the edge was derived by exact id match and carries
/// the fuzzy-match confidence otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModulePrerequisiteMapping {
    pub module_id_uni: String,
    pub prereq_module_id_uni: String,
    pub score: Option<i64>,
    pub extracted_identifier_id: Option<u64>,
}

/// Minimal id/title projection used by lookup endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSummary {
    pub id: String,
    pub title: String,
}
