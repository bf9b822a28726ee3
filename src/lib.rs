pub mod catalog;
pub mod core;
pub mod criteria;
pub mod embedding;
pub mod engine;
pub mod filter;
pub mod rank;
pub mod rerank;
pub mod utils;
pub mod vector;

pub use crate::core::config::ModScoutConfig;
pub use crate::core::error::{ModScoutError, Result};
pub use catalog::{Catalog, CatalogSnapshot};
pub use criteria::StudentCriteria;
pub use embedding::{EmbeddingGenerator, EmbeddingProvider};
pub use engine::{ModScoutEngine, RecommendResponse};
pub use filter::{filter_modules, FilteredModule};
pub use rerank::{RankedModule, Reranker, RerankerAdapter};
pub use utils::safe_truncate;
pub use vector::{TopicMatch, TopicVectorIndex};

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

pub const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text";

pub const DEFAULT_RERANKER_MODEL: &str = "gpt-4o-mini";

pub const DEFAULT_CACHE_SIZE: usize = 1000;

pub const DEFAULT_CACHE_TTL: u64 = 300;
