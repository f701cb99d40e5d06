//! Domain layer - Core types, validation and the traits external
//! collaborators implement

pub mod embedding;
pub mod embedding_cache;
pub mod error;
pub mod search;

pub use embedding::{cosine_similarity, EmbeddingProvider};
pub use embedding_cache::{normalize_query, CacheSnapshot, CacheStats, SnapshotEntry};
pub use error::DomainError;
pub use search::{
    ContentType, Language, SearchInput, SearchLimits, SearchResult, SemanticQuery,
    SimilarityBackend, SimilarityCandidate,
};
