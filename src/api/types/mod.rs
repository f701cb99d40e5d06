//! HTTP request, response and error types

pub mod error;
pub mod json;
pub mod search;

pub use error::{ApiError, ApiErrorResponse, ApiErrorType};
pub use json::Json;
pub use search::{OneOrMany, SearchMetadata, SemanticSearchRequest, SemanticSearchResponse};
