//! One-shot pre-warm of the embedding cache from a snapshot file

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{error, info, warn};

use super::EmbeddingCache;
use crate::domain::embedding_cache::CacheSnapshot;
use crate::domain::DomainError;

/// What a call to [`CacheSnapshotLoader::load_once`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A previous call already attempted the load
    AlreadyAttempted,
    /// No snapshot file at the configured path
    Missing,
    Loaded { count: usize },
    /// The file could not be read or parsed; the cache starts cold
    Failed { reason: String },
}

/// Hydrates an [`EmbeddingCache`] from a persisted snapshot at most once
///
/// The guard is set before the first attempt, so a failed load is not
/// retried. Failures never propagate: the service starts with a cold cache.
#[derive(Debug)]
pub struct CacheSnapshotLoader {
    cache: Arc<EmbeddingCache>,
    path: PathBuf,
    expected_model: Option<String>,
    attempted: AtomicBool,
}

impl CacheSnapshotLoader {
    pub fn new(cache: Arc<EmbeddingCache>, path: impl Into<PathBuf>) -> Self {
        Self {
            cache,
            path: path.into(),
            expected_model: None,
            attempted: AtomicBool::new(false),
        }
    }

    /// Warn when the snapshot was generated with a different model
    pub fn with_expected_model(mut self, model: impl Into<String>) -> Self {
        self.expected_model = Some(model.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn has_attempted(&self) -> bool {
        self.attempted.load(Ordering::SeqCst)
    }

    /// Re-arm the guard so the next `load_once` reads the file again
    pub fn reset(&self) {
        self.attempted.store(false, Ordering::SeqCst);
    }

    pub async fn load_once(&self) -> LoadOutcome {
        if self.attempted.swap(true, Ordering::SeqCst) {
            info!("Embedding cache snapshot already loaded, skipping");
            return LoadOutcome::AlreadyAttempted;
        }

        match tokio::fs::try_exists(&self.path).await {
            Ok(true) => {}
            Ok(false) => {
                info!(
                    path = %self.path.display(),
                    "No embedding cache snapshot found, starting cold (run `warmup` to generate one)"
                );
                return LoadOutcome::Missing;
            }
            Err(e) => return self.failed(DomainError::snapshot(e.to_string())),
        }

        let snapshot = match self.read_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => return self.failed(e),
        };

        if let Some(expected) = &self.expected_model {
            if *expected != snapshot.model {
                warn!(
                    snapshot_model = %snapshot.model,
                    configured_model = %expected,
                    "Embedding cache snapshot was generated with a different model"
                );
            }
        }

        let generated_at = snapshot.generated_at;
        let model = snapshot.model.clone();
        let (entries, skipped) = snapshot.into_cache_entries();
        if skipped > 0 {
            warn!(
                skipped,
                path = %self.path.display(),
                "Skipped snapshot entries with empty or non-finite embeddings"
            );
        }
        let count = self.cache.load_from_snapshot(entries);

        info!(
            count,
            skipped,
            generated_at = %generated_at.to_rfc3339(),
            model = %model,
            "Loaded embedding cache snapshot"
        );

        LoadOutcome::Loaded { count }
    }

    async fn read_snapshot(&self) -> Result<CacheSnapshot, DomainError> {
        let data = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            DomainError::snapshot(format!("Failed to read {}: {}", self.path.display(), e))
        })?;

        serde_json::from_str(&data).map_err(|e| {
            DomainError::snapshot(format!("Failed to parse {}: {}", self.path.display(), e))
        })
    }

    fn failed(&self, err: DomainError) -> LoadOutcome {
        error!(
            path = %self.path.display(),
            error = %err,
            "Failed to load embedding cache snapshot, starting cold"
        );

        LoadOutcome::Failed {
            reason: err.to_string(),
        }
    }
}
