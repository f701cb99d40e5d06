//! Infrastructure layer - External service implementations

pub mod embedding;
pub mod embedding_cache;
pub mod logging;
pub mod observability;
pub mod services;
pub mod similarity;
