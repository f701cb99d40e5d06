//! Persisted cache snapshot format
//!
//! Produced by the `warmup` job and read once at startup. The JSON layout is
//! a stable contract shared with older tooling:
//!
//! ```json
//! {
//!   "version": "1.0",
//!   "generatedAt": "2025-01-01T00:00:00Z",
//!   "model": "text-embedding-3-small",
//!   "embeddings": [
//!     { "query": "Patience", "normalizedQuery": "patience", "embedding": [0.1], "timestamp": 1735689600000 }
//!   ]
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::normalize_query;

pub const SNAPSHOT_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheSnapshot {
    pub version: String,
    pub generated_at: DateTime<Utc>,
    pub model: String,
    pub embeddings: Vec<SnapshotEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEntry {
    /// Query as originally written
    pub query: String,
    pub normalized_query: String,
    pub embedding: Vec<f32>,
    /// Milliseconds since the Unix epoch when the embedding was generated
    pub timestamp: i64,
}

impl SnapshotEntry {
    pub fn new(query: impl Into<String>, embedding: Vec<f32>, timestamp: DateTime<Utc>) -> Self {
        let query = query.into();
        Self {
            normalized_query: normalize_query(&query),
            query,
            embedding,
            timestamp: timestamp.timestamp_millis(),
        }
    }

    /// Whether the embedding can be served: non-empty with finite components
    pub fn is_usable(&self) -> bool {
        !self.embedding.is_empty() && self.embedding.iter().all(|v| v.is_finite())
    }
}

impl CacheSnapshot {
    pub fn new(model: impl Into<String>, embeddings: Vec<SnapshotEntry>) -> Self {
        Self {
            version: SNAPSHOT_VERSION.to_string(),
            generated_at: Utc::now(),
            model: model.into(),
            embeddings,
        }
    }

    /// Usable entries as `(normalized query, embedding)` pairs, ready for
    /// bulk load, plus the number of entries dropped as unusable
    pub fn into_cache_entries(self) -> (Vec<(String, Vec<f32>)>, usize) {
        let total = self.embeddings.len();
        let entries: Vec<_> = self
            .embeddings
            .into_iter()
            .filter(SnapshotEntry::is_usable)
            .map(|entry| (entry.normalized_query, entry.embedding))
            .collect();
        let skipped = total - entries.len();

        (entries, skipped)
    }
}
