//! Infrastructure services

mod cache_warmup_service;
mod semantic_search_service;

pub use cache_warmup_service::{write_snapshot, CacheWarmupService, WarmupReport};
pub use semantic_search_service::{SearchOutcome, SemanticSearchConfig, SemanticSearchService};
