//! Shared in-memory catalog used across unit tests.

use super::models::{
    Module, ModulePrerequisiteMapping, ModuleTopicMapping, OrgType, Organisation, Topic,
};
use super::store::CatalogSnapshot;

fn org(org_id: &str, name: &str, org_type: OrgType) -> Organisation {
    Organisation {
        org_id: org_id.to_string(),
        name: name.to_string(),
        org_type,
        parent_org_id: None,
        dep_id: None,
        school_id: None,
    }
}

fn module(
    module_id: u64,
    uni_id: &str,
    name: &str,
    org_id: &str,
    level: &str,
    lang: &str,
    ects: i64,
    digital_score: i64,
) -> Module {
    Module {
        module_id,
        module_id_uni: uni_id.to_string(),
        name: name.to_string(),
        org_id: Some(org_id.to_string()),
        level: Some(level.to_string()),
        lang: Some(lang.to_string()),
        ects: Some(ects),
        prereq: Some(format!("See description of {name}")),
        description: Some(format!("{name} module")),
        digital_score: Some(digital_score),
        valid_from: None,
        valid_to: None,
        link: None,
    }
}

pub fn topic(topic_id: u64, label: &str, embedding: [f32; 3]) -> Topic {
    Topic {
        topic_id,
        topic: label.to_string(),
        embedding: Some(embedding.to_vec()),
    }
}

/// Four modules under one school/department/chair branch, with topic tags
/// and one prerequisite edge (IN2300 requires IN2259).
pub fn small_catalog_snapshot() -> CatalogSnapshot {
    let school = org(
        "org-school-cit",
        "Computation, Information and Technology",
        OrgType::School,
    );
    let mut department = org("org-dep-cs", "Department Computer Science", OrgType::Department);
    department.parent_org_id = Some(school.org_id.clone());
    department.dep_id = Some(department.org_id.clone());
    department.school_id = Some(school.org_id.clone());
    let mut chair = org("org-chair-ds", "Chair of Decentralized Systems", OrgType::Chair);
    chair.parent_org_id = Some(department.org_id.clone());
    chair.dep_id = Some(department.org_id.clone());
    chair.school_id = Some(school.org_id.clone());

    let modules = vec![
        module(1, "IN2259", "Distributed Systems", "org-chair-ds", "Bachelor/Master", "English", 8, 2),
        module(2, "IN2300", "Cloud Architectures", "org-chair-ds", "Master", "English", 12, 3),
        module(3, "MA1001", "Linear Algebra", "org-chair-ds", "Bachelor", "German", 9, 1),
        module(4, "IN0010", "Machine Learning Basics", "org-chair-ds", "Unknown", "German/English", 3, 2),
    ];

    let topics = vec![
        topic(1, "Distributed Computing", [1.0, 0.0, 0.0]),
        topic(2, "Cloud Systems", [0.9, 0.1, 0.0]),
        topic(3, "Affine Geometry", [0.0, 1.0, 0.0]),
        topic(4, "Machine Learning", [0.0, 0.0, 1.0]),
    ];

    let module_topics = vec![
        ModuleTopicMapping { module_id: 1, topic_id: 1 },
        ModuleTopicMapping { module_id: 1, topic_id: 2 },
        ModuleTopicMapping { module_id: 2, topic_id: 2 },
        ModuleTopicMapping { module_id: 3, topic_id: 3 },
        ModuleTopicMapping { module_id: 4, topic_id: 4 },
    ];

    let module_prerequisites = vec![ModulePrerequisiteMapping {
        module_id_uni: "IN2300".to_string(),
        prereq_module_id_uni: "IN2259".to_string(),
        score: None,
        extracted_identifier_id: None,
    }];

    CatalogSnapshot {
        modules,
        organisations: vec![school, department, chair],
        topics,
        module_topics,
        module_prerequisites,
    }
}
