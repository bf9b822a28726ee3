use std::collections::{BTreeSet, HashMap};

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::core::error::{ModScoutError, Result};

/// Catalog level value matched by any widened level filter.
pub const LEVEL_UNKNOWN: &str = "Unknown";
/// Catalog language value matched by any widened language filter.
pub const LANG_UNKNOWN: &str = "Unknown";
const LANG_GERMAN_ENGLISH: &str = "German/English";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
    EnumString, EnumIter,
)]
pub enum StudyLevel {
    Bachelor,
    Master,
    Doctor,
    Other,
    Unknown,
}

impl StudyLevel {
    pub fn from_label(label: &str) -> Result<Self> {
        label
            .parse()
            .map_err(|_| ModScoutError::InvalidCriteria(format!("unknown study level: {label}")))
    }

    /// Widen a requested level into the set of acceptable catalog values.
    /// Mixed-level modules count for both degrees and unlabeled modules are
    /// never excluded.
    pub fn widen(&self) -> BTreeSet<String> {
        let levels: &[&str] = match self {
            StudyLevel::Bachelor => &["Bachelor", "Bachelor/Master", LEVEL_UNKNOWN],
            StudyLevel::Master => &["Bachelor/Master", "Master", LEVEL_UNKNOWN],
            _ => &[LEVEL_UNKNOWN],
        };
        levels.iter().map(|s| s.to_string()).collect()
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
    EnumString, EnumIter,
)]
pub enum ModuleLanguage {
    German,
    English,
    Other,
}

impl ModuleLanguage {
    pub fn from_label(label: &str) -> Result<Self> {
        label
            .parse()
            .map_err(|_| ModScoutError::InvalidCriteria(format!("unknown language: {label}")))
    }

    /// Widen requested languages into acceptable catalog values. Unlabeled
    /// modules always match; bilingual modules match any request that
    /// includes English.
    pub fn widen(languages: &BTreeSet<ModuleLanguage>) -> BTreeSet<String> {
        let mut widened: BTreeSet<String> = languages.iter().map(|l| l.to_string()).collect();
        widened.insert(LANG_UNKNOWN.to_string());
        if languages.contains(&ModuleLanguage::English) {
            widened.insert(LANG_GERMAN_ENGLISH.to_string());
        }
        widened
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
    EnumString, EnumIter,
)]
pub enum School {
    #[strum(serialize = "Computation, Information and Technology")]
    ComputationInformationTechnology,
    #[strum(serialize = "Engineering and Design")]
    EngineeringDesign,
    #[strum(serialize = "Natural Sciences")]
    NaturalSciences,
    #[strum(serialize = "Life Sciences")]
    LifeSciences,
    #[strum(serialize = "Medicine and Health")]
    MedicineHealth,
    #[strum(serialize = "Management")]
    Management,
    #[strum(serialize = "Social Sciences and Technology")]
    SocialSciencesTechnology,
}

impl School {
    /// Fails with InvalidCriteria on an unrecognized label; a school filter
    /// is never silently dropped.
    pub fn from_label(label: &str) -> Result<Self> {
        label
            .parse()
            .map_err(|_| ModScoutError::InvalidCriteria(format!("unknown school: {label}")))
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
    EnumString, EnumIter,
)]
pub enum Department {
    #[strum(serialize = "Department Aerospace and Geodesy")]
    AerospaceAndGeodesy,
    #[strum(serialize = "Department Architecture")]
    Architecture,
    #[strum(serialize = "Department Bioscience")]
    Bioscience,
    #[strum(serialize = "Department Chemistry")]
    Chemistry,
    #[strum(serialize = "Department Civil and Environmental Engineering")]
    CivilAndEnvironmentalEngineering,
    #[strum(serialize = "Department Clinical Medicine")]
    ClinicalMedicine,
    #[strum(serialize = "Department Computer Engineering")]
    ComputerEngineering,
    #[strum(serialize = "Department Computer Science")]
    ComputerScience,
    #[strum(serialize = "Department Economics and Policy")]
    EconomicsAndPolicy,
    #[strum(serialize = "Department Educational Sciences")]
    EducationalSciences,
    #[strum(serialize = "Department Electrical Engineering")]
    ElectricalEngineering,
    #[strum(serialize = "Department Energy and Process Engineering")]
    EnergyAndProcessEngineering,
    #[strum(serialize = "Department Engineering Physics and Computation")]
    EngineeringPhysicsAndComputation,
    #[strum(serialize = "Department Finance and Accounting")]
    FinanceAndAccounting,
    #[strum(serialize = "Department Governance")]
    Governance,
    #[strum(serialize = "Department Health and Sport Sciences")]
    HealthAndSportSciences,
    #[strum(serialize = "Department Innovation and Entrepreneurship")]
    InnovationAndEntrepreneurship,
    #[strum(serialize = "Department Life Science Engineering")]
    LifeScienceEngineering,
    #[strum(serialize = "Department Life Science Systems")]
    LifeScienceSystems,
    #[strum(serialize = "Department Marketing, Strategy and Leadership")]
    MarketingStrategyAndLeadership,
    #[strum(serialize = "Department Materials Engineering")]
    MaterialsEngineering,
    #[strum(serialize = "Department Mathematics")]
    Mathematics,
    #[strum(serialize = "Department Mechanical Engineering")]
    MechanicalEngineering,
    #[strum(serialize = "Department Mobility Systems Engineering")]
    MobilitySystemsEngineering,
    #[strum(serialize = "Department Molecular Life Sciences")]
    MolecularLifeSciences,
    #[strum(serialize = "Department Operations and Technology")]
    OperationsAndTechnology,
    #[strum(serialize = "Department Physics")]
    Physics,
    #[strum(serialize = "Department Preclinical Medicine")]
    PreclinicalMedicine,
    #[strum(serialize = "Department Science, Technology and Society")]
    ScienceTechnologyAndSociety,
}

impl Department {
    pub fn from_label(label: &str) -> Result<Self> {
        label
            .parse()
            .map_err(|_| ModScoutError::InvalidCriteria(format!("unknown department: {label}")))
    }

    /// School a department belongs to, via the static hierarchy table.
    pub fn school(&self) -> School {
        DEPARTMENT_SCHOOLS[self]
    }
}

lazy_static! {
    static ref DEPARTMENT_SCHOOLS: HashMap<Department, School> = {
        use Department::*;
        use School::*;
        HashMap::from([
            (Mathematics, ComputationInformationTechnology),
            (ComputerScience, ComputationInformationTechnology),
            (ComputerEngineering, ComputationInformationTechnology),
            (ElectricalEngineering, ComputationInformationTechnology),
            (AerospaceAndGeodesy, EngineeringDesign),
            (Architecture, EngineeringDesign),
            (CivilAndEnvironmentalEngineering, EngineeringDesign),
            (EnergyAndProcessEngineering, EngineeringDesign),
            (EngineeringPhysicsAndComputation, EngineeringDesign),
            (MaterialsEngineering, EngineeringDesign),
            (MechanicalEngineering, EngineeringDesign),
            (MobilitySystemsEngineering, EngineeringDesign),
            (MolecularLifeSciences, LifeSciences),
            (LifeScienceEngineering, LifeSciences),
            (LifeScienceSystems, LifeSciences),
            (EconomicsAndPolicy, Management),
            (FinanceAndAccounting, Management),
            (InnovationAndEntrepreneurship, Management),
            (MarketingStrategyAndLeadership, Management),
            (OperationsAndTechnology, Management),
            (HealthAndSportSciences, MedicineHealth),
            (PreclinicalMedicine, MedicineHealth),
            (ClinicalMedicine, MedicineHealth),
            (Physics, NaturalSciences),
            (Bioscience, NaturalSciences),
            (Chemistry, NaturalSciences),
            (EducationalSciences, SocialSciencesTechnology),
            (Governance, SocialSciencesTechnology),
            (ScienceTechnologyAndSociety, SocialSciencesTechnology),
        ])
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_level_widen_bachelor_superset() {
        let widened = StudyLevel::Bachelor.widen();
        assert!(widened.contains("Bachelor"));
        assert!(widened.contains("Bachelor/Master"));
        assert!(widened.contains(LEVEL_UNKNOWN));
        assert!(!widened.contains("Master"));
    }

    #[test]
    fn test_level_widen_master() {
        let widened = StudyLevel::Master.widen();
        assert!(widened.contains("Master"));
        assert!(widened.contains("Bachelor/Master"));
        assert!(!widened.contains("Bachelor"));
    }

    #[test]
    fn test_level_widen_always_contains_unknown() {
        for level in StudyLevel::iter() {
            assert!(level.widen().contains(LEVEL_UNKNOWN), "{level}");
        }
    }

    #[test]
    fn test_level_widen_other_is_unknown_only() {
        assert_eq!(StudyLevel::Doctor.widen().len(), 1);
        assert_eq!(StudyLevel::Other.widen().len(), 1);
    }

    #[test]
    fn test_language_widen_english_matches_bilingual() {
        let widened = ModuleLanguage::widen(&BTreeSet::from([ModuleLanguage::English]));
        assert!(widened.contains("English"));
        assert!(widened.contains("German/English"));
        assert!(widened.contains(LANG_UNKNOWN));
        assert!(!widened.contains("German"));
    }

    #[test]
    fn test_language_widen_german_only() {
        let widened = ModuleLanguage::widen(&BTreeSet::from([ModuleLanguage::German]));
        assert!(widened.contains("German"));
        assert!(!widened.contains("German/English"));
        assert!(widened.contains(LANG_UNKNOWN));
    }

    #[test]
    fn test_language_widen_both() {
        let widened = ModuleLanguage::widen(&BTreeSet::from([
            ModuleLanguage::German,
            ModuleLanguage::English,
        ]));
        assert!(widened.contains("German/English"));
    }

    #[test]
    fn test_school_label_roundtrip() {
        let school = School::from_label("Computation, Information and Technology").unwrap();
        assert_eq!(school, School::ComputationInformationTechnology);
        assert_eq!(school.to_string(), "Computation, Information and Technology");
    }

    #[test]
    fn test_unknown_labels_fail_fast() {
        assert!(School::from_label("Hogwarts").is_err());
        assert!(Department::from_label("Department of Mysteries").is_err());
        assert!(StudyLevel::from_label("Postdoc").is_err());
    }

    #[test]
    fn test_every_department_has_a_school() {
        for department in Department::iter() {
            // Panics on a missing table entry.
            let _ = department.school();
        }
    }

    #[test]
    fn test_department_school_table() {
        assert_eq!(
            Department::Mathematics.school(),
            School::ComputationInformationTechnology
        );
        assert_eq!(Department::Physics.school(), School::NaturalSciences);
    }
}
