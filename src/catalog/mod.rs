pub mod models;
pub mod store;
pub mod title_match;

#[cfg(test)]
pub(crate) mod test_fixtures;

pub use models::{
    Module, ModulePrerequisiteMapping, ModuleSummary, ModuleTopicMapping, OrgType, Organisation,
    Topic,
};
pub use store::{Catalog, CatalogSnapshot};
