//! Query-embedding cache domain: key normalization, statistics and the
//! persisted pre-warm snapshot format

mod key;
mod snapshot;
mod stats;

pub use key::normalize_query;
pub use snapshot::{CacheSnapshot, SnapshotEntry, SNAPSHOT_VERSION};
pub use stats::CacheStats;
