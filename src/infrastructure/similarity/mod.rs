//! Similarity backend implementations

mod in_memory;
mod pgvector;

pub use in_memory::{CorpusDocument, InMemorySimilarityBackend};
pub use pgvector::PgvectorSimilarityBackend;
