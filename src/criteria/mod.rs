pub mod mapping;

pub use mapping::{Department, ModuleLanguage, School, StudyLevel};

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::core::error::{ModScoutError, Result};

/// Structured student preferences for one discovery request. All set fields
/// default to empty, meaning no restriction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudentCriteria {
    pub study_level: Option<StudyLevel>,
    #[serde(default)]
    pub schools: BTreeSet<School>,
    #[serde(default)]
    pub departments: BTreeSet<Department>,
    #[serde(default)]
    pub languages: BTreeSet<ModuleLanguage>,
    /// University ids of modules the student has already completed.
    #[serde(default)]
    pub previous_modules: BTreeSet<String>,
    #[serde(default)]
    pub topics_of_interest: BTreeSet<String>,
    #[serde(default)]
    pub topics_to_exclude: BTreeSet<String>,
    pub ects_min: Option<i64>,
    pub ects_max: Option<i64>,
    pub digital_score_min: Option<i64>,
    pub digital_score_max: Option<i64>,
}

impl StudentCriteria {
    /// Range sanity, rejected before any catalog work.
    pub fn validate(&self) -> Result<()> {
        if let (Some(min), Some(max)) = (self.ects_min, self.ects_max) {
            if min > max {
                return Err(ModScoutError::InvalidCriteria(format!(
                    "ects range {min}..{max} has min > max"
                )));
            }
        }
        if let (Some(min), Some(max)) = (self.digital_score_min, self.digital_score_max) {
            if min > max {
                return Err(ModScoutError::InvalidCriteria(format!(
                    "digital score range {min}..{max} has min > max"
                )));
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.study_level.is_none()
            && self.schools.is_empty()
            && self.departments.is_empty()
            && self.languages.is_empty()
            && self.previous_modules.is_empty()
            && self.topics_of_interest.is_empty()
            && self.topics_to_exclude.is_empty()
            && self.ects_min.is_none()
            && self.ects_max.is_none()
            && self.digital_score_min.is_none()
            && self.digital_score_max.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unrestricted() {
        let criteria = StudentCriteria::default();
        assert!(criteria.is_empty());
        assert!(criteria.validate().is_ok());
    }

    #[test]
    fn test_inverted_ects_range_rejected() {
        let criteria = StudentCriteria {
            ects_min: Some(10),
            ects_max: Some(5),
            ..Default::default()
        };
        let err = criteria.validate().unwrap_err();
        assert!(matches!(err, ModScoutError::InvalidCriteria(_)));
    }

    #[test]
    fn test_inverted_score_range_rejected() {
        let criteria = StudentCriteria {
            digital_score_min: Some(3),
            digital_score_max: Some(1),
            ..Default::default()
        };
        assert!(criteria.validate().is_err());
    }

    #[test]
    fn test_equal_bounds_are_valid() {
        let criteria = StudentCriteria {
            ects_min: Some(5),
            ects_max: Some(5),
            ..Default::default()
        };
        assert!(criteria.validate().is_ok());
    }
}
