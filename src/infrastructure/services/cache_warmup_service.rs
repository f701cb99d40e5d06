//! Offline generation of the embedding cache snapshot

use std::collections::HashSet;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

use crate::domain::embedding_cache::{normalize_query, CacheSnapshot, SnapshotEntry};
use crate::domain::{DomainError, EmbeddingProvider};

/// `{ "queries": [...] }` input file
#[derive(Debug, Deserialize)]
struct PopularQueries {
    queries: Vec<String>,
}

/// Summary of one warmup run
#[derive(Debug, Clone)]
pub struct WarmupReport {
    pub generated: usize,
    pub failed: usize,
    /// Blank queries and repeats of an already-seen normalized query
    pub skipped: usize,
    pub output: PathBuf,
}

/// Generates embeddings for popular queries and persists them as a snapshot
pub struct CacheWarmupService {
    provider: Arc<dyn EmbeddingProvider>,
    delay: Duration,
}

impl Debug for CacheWarmupService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheWarmupService")
            .field("provider", &self.provider.provider_name())
            .field("model", &self.provider.model())
            .field("delay", &self.delay)
            .finish()
    }
}

impl CacheWarmupService {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            provider,
            delay: Duration::from_millis(100),
        }
    }

    /// Pause between provider calls to stay under rate limits
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub async fn run(&self, queries_path: &Path, output: &Path) -> Result<WarmupReport, DomainError> {
        let queries = read_queries(queries_path).await?;
        info!(count = queries.len(), path = %queries_path.display(), "Read popular queries");

        let (snapshot, mut report) = self.generate(&queries).await;
        write_snapshot(&snapshot, output).await?;
        report.output = output.to_path_buf();

        info!(
            generated = report.generated,
            failed = report.failed,
            skipped = report.skipped,
            output = %output.display(),
            "Embedding cache snapshot written"
        );

        Ok(report)
    }

    /// Embed every distinct query; failures are logged and counted
    pub async fn generate(&self, queries: &[String]) -> (CacheSnapshot, WarmupReport) {
        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(queries.len());
        let mut failed = 0;
        let mut skipped = 0;

        for (i, query) in queries.iter().enumerate() {
            let normalized = normalize_query(query);
            if normalized.is_empty() || !seen.insert(normalized) {
                skipped += 1;
                continue;
            }

            if i > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            match self.provider.embed(query).await {
                Ok(embedding) if !embedding.is_empty() => {
                    info!(index = i + 1, total = queries.len(), query = %query, "Generated embedding");
                    entries.push(SnapshotEntry::new(query.as_str(), embedding, Utc::now()));
                }
                Ok(_) => {
                    warn!(query = %query, "Provider returned an empty embedding");
                    failed += 1;
                }
                Err(e) => {
                    warn!(query = %query, error = %e, "Failed to generate embedding");
                    failed += 1;
                }
            }
        }

        let report = WarmupReport {
            generated: entries.len(),
            failed,
            skipped,
            output: PathBuf::new(),
        };

        (CacheSnapshot::new(self.provider.model(), entries), report)
    }
}

async fn read_queries(path: &Path) -> Result<Vec<String>, DomainError> {
    let data = tokio::fs::read_to_string(path).await.map_err(|e| {
        DomainError::configuration(format!("Failed to read {}: {}", path.display(), e))
    })?;

    let parsed: PopularQueries = serde_json::from_str(&data).map_err(|e| {
        DomainError::configuration(format!("Failed to parse {}: {}", path.display(), e))
    })?;

    Ok(parsed.queries)
}

/// Write the snapshot via a temporary file and rename, so readers never see
/// a partial file
pub async fn write_snapshot(snapshot: &CacheSnapshot, path: &Path) -> Result<(), DomainError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            DomainError::snapshot(format!("Failed to create {}: {}", parent.display(), e))
        })?;
    }

    let json = serde_json::to_vec_pretty(snapshot)
        .map_err(|e| DomainError::snapshot(format!("Failed to encode snapshot: {}", e)))?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, json).await.map_err(|e| {
        DomainError::snapshot(format!("Failed to write {}: {}", tmp.display(), e))
    })?;

    tokio::fs::rename(&tmp, path).await.map_err(|e| {
        DomainError::snapshot(format!("Failed to move snapshot to {}: {}", path.display(), e))
    })
}
