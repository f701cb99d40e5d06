//! Semantic search domain: content types, query validation and the
//! similarity backend seam

mod backend;
mod content;
mod query;

pub use backend::SimilarityBackend;
pub use content::{ContentType, Language, SearchResult, SimilarityCandidate};
pub use query::{QueryValidationError, SearchInput, SearchLimits, SemanticQuery};

#[cfg(test)]
pub use backend::MockSimilarityBackend;
