//! Embedding cache and its snapshot loader

mod loader;
mod store;

pub use loader::{CacheSnapshotLoader, LoadOutcome};
pub use store::{EmbeddingCache, EmbeddingCacheConfig};
