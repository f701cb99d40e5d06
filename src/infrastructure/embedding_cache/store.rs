//! Bounded, expiring query-embedding cache

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use lru::LruCache;
use metrics::counter;
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::domain::embedding_cache::{normalize_query, CacheStats};
use crate::domain::DomainError;

/// Configuration for the embedding cache
#[derive(Debug, Clone)]
pub struct EmbeddingCacheConfig {
    /// Maximum number of entries; must be greater than zero
    pub max_entries: usize,
    /// Age after which an entry is never returned
    pub ttl: Duration,
}

impl Default for EmbeddingCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            ttl: Duration::from_secs(60 * 60),
        }
    }
}

impl EmbeddingCacheConfig {
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

enum Lookup {
    Hit(Vec<f32>),
    Expired,
    Missing,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    embedding: Vec<f32>,
    inserted_at: Instant,
}

/// LRU + TTL memoization of query text to embedding vector
///
/// - At most `max_entries` entries; inserting a new key at capacity evicts
///   the least-recently-used one.
/// - A hit moves the entry to the most-recently-used end but keeps its
///   insertion time, so TTL is measured from the last write.
/// - Expiry is checked lazily on read. Entries that are never read again
///   stay until evicted.
///
/// All operations lock a single mutex for a short, non-suspending section.
#[derive(Debug)]
pub struct EmbeddingCache {
    entries: Mutex<LruCache<String, CacheEntry>>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

impl EmbeddingCache {
    pub fn new(config: EmbeddingCacheConfig) -> Result<Self, DomainError> {
        let capacity = NonZeroUsize::new(config.max_entries).ok_or_else(|| {
            DomainError::configuration("Embedding cache max_entries must be greater than 0")
        })?;

        Ok(Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl: config.ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
        })
    }

    /// Look up the embedding for `query`, normalizing it first
    pub fn get(&self, query: &str) -> Option<Vec<f32>> {
        let key = normalize_query(query);
        let now = Instant::now();
        let mut entries = self.entries.lock();

        let lookup = match entries.get(&key) {
            None => Lookup::Missing,
            Some(entry) if now.duration_since(entry.inserted_at) >= self.ttl => Lookup::Expired,
            Some(entry) => Lookup::Hit(entry.embedding.clone()),
        };

        match lookup {
            Lookup::Hit(embedding) => {
                drop(entries);
                self.hits.fetch_add(1, Ordering::Relaxed);
                counter!("embedding_cache_hits_total").increment(1);
                Some(embedding)
            }
            Lookup::Expired => {
                entries.pop(&key);
                drop(entries);
                self.expirations.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(key = %key, "Embedding cache entry expired");
                self.record_miss();
                None
            }
            Lookup::Missing => {
                drop(entries);
                self.record_miss();
                None
            }
        }
    }

    /// Store the embedding for `query`, replacing any entry with the same
    /// normalized key
    pub fn set(&self, query: &str, embedding: Vec<f32>) {
        let key = normalize_query(query);
        let now = Instant::now();
        let mut entries = self.entries.lock();
        self.insert(&mut entries, key, embedding, now);
    }

    /// Bulk-insert pre-normalized entries, all stamped with the current time
    ///
    /// Keys are used as given. Loading more entries than the capacity, or
    /// loading into a non-empty cache, evicts under the usual LRU policy.
    pub fn load_from_snapshot<I>(&self, items: I) -> usize
    where
        I: IntoIterator<Item = (String, Vec<f32>)>,
    {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let mut loaded = 0;

        for (normalized_query, embedding) in items {
            self.insert(&mut entries, normalized_query, embedding, now);
            loaded += 1;
        }

        loaded
    }

    /// Remove every entry
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.lock();

        CacheStats {
            size: entries.len(),
            max_size: entries.cap().get(),
            ttl_secs: self.ttl.as_secs(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn insert(
        &self,
        entries: &mut LruCache<String, CacheEntry>,
        key: String,
        embedding: Vec<f32>,
        now: Instant,
    ) {
        let entry = CacheEntry {
            embedding,
            inserted_at: now,
        };

        // `push` hands back either the replaced value for the same key or
        // the evicted least-recently-used entry.
        if let Some((displaced, _)) = entries.push(key.clone(), entry) {
            if displaced != key {
                self.evictions.fetch_add(1, Ordering::Relaxed);
                counter!("embedding_cache_evictions_total").increment(1);
                tracing::trace!(evicted = %displaced, "Evicted least-recently-used embedding");
            }
        }
    }

    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        counter!("embedding_cache_misses_total").increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(max_entries: usize, ttl_secs: u64) -> EmbeddingCache {
        EmbeddingCache::new(
            EmbeddingCacheConfig::default()
                .with_max_entries(max_entries)
                .with_ttl(Duration::from_secs(ttl_secs)),
        )
        .unwrap()
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let result = EmbeddingCache::new(EmbeddingCacheConfig::default().with_max_entries(0));
        assert!(matches!(result, Err(DomainError::Configuration { .. })));
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let cache = cache(4, 60);

        assert_eq!(cache.get("mercy"), None);
        assert_eq!(cache.stats().misses, 1);
    }

    #[tokio::test]
    async fn test_normalization_equivalence() {
        let cache = cache(4, 60);
        cache.set("Patience  ", vec![1.0, 2.0]);

        assert_eq!(cache.get("patience"), Some(vec![1.0, 2.0]));
        assert_eq!(cache.get("  PATIENCE"), Some(vec![1.0, 2.0]));

        cache.set("Hello   World", vec![3.0]);
        assert_eq!(cache.get("hello world"), Some(vec![3.0]));
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_set_overwrites_existing_key() {
        let cache = cache(2, 60);
        cache.set("mercy", vec![1.0]);
        cache.set("MERCY", vec![2.0]);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("mercy"), Some(vec![2.0]));
        assert_eq!(cache.stats().evictions, 0);
    }

    #[tokio::test]
    async fn test_size_never_exceeds_max() {
        let cache = cache(3, 60);

        for i in 0..10 {
            cache.set(&format!("query {}", i), vec![i as f32]);
            assert!(cache.len() <= 3);
        }

        let stats = cache.stats();
        assert_eq!(stats.size, 3);
        assert_eq!(stats.max_size, 3);
        assert_eq!(stats.evictions, 7);
    }

    #[tokio::test]
    async fn test_insert_beyond_capacity_evicts_least_recently_used() {
        let cache = cache(3, 60);
        cache.set("a", vec![1.0]);
        cache.set("b", vec![2.0]);
        cache.set("c", vec![3.0]);

        cache.set("d", vec![4.0]);

        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some(vec![2.0]));
        assert_eq!(cache.get("c"), Some(vec![3.0]));
        assert_eq!(cache.get("d"), Some(vec![4.0]));
    }

    #[tokio::test]
    async fn test_read_bumps_recency() {
        let max = 3;

        // Reading A before each insert keeps it at the most-recently-used end
        let cache = cache(max, 60);
        cache.set("a", vec![1.0]);
        for i in 0..max {
            assert!(cache.get("a").is_some());
            cache.set(&format!("other {}", i), vec![0.0]);
        }
        assert_eq!(cache.get("a"), Some(vec![1.0]));

        // Without reads A is the oldest and gets evicted
        let cache = self::cache(max, 60);
        cache.set("a", vec![1.0]);
        for i in 0..max {
            cache.set(&format!("other {}", i), vec![0.0]);
        }
        assert_eq!(cache.get("a"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_at_ttl() {
        let cache = cache(4, 60);
        cache.set("mercy", vec![1.0]);

        tokio::time::advance(Duration::from_millis(59_999)).await;
        assert_eq!(cache.get("mercy"), Some(vec![1.0]));

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(cache.get("mercy"), None);

        let stats = cache.stats();
        assert_eq!(stats.size, 0, "expired entry is removed on read");
        assert_eq!(stats.expirations, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hit_does_not_extend_ttl() {
        let cache = cache(4, 10);
        cache.set("mercy", vec![1.0]);

        tokio::time::advance(Duration::from_secs(9)).await;
        assert!(cache.get("mercy").is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get("mercy").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_resets_timestamp() {
        let cache = cache(4, 10);
        cache.set("mercy", vec![1.0]);

        tokio::time::advance(Duration::from_secs(8)).await;
        cache.set("mercy", vec![2.0]);

        tokio::time::advance(Duration::from_secs(8)).await;
        assert_eq!(cache.get("mercy"), Some(vec![2.0]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entries_not_purged_without_read() {
        let cache = cache(4, 1);
        cache.set("a", vec![1.0]);
        cache.set("b", vec![2.0]);

        tokio::time::advance(Duration::from_secs(5)).await;

        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_load_from_snapshot_uses_keys_verbatim() {
        let cache = cache(10, 60);
        let loaded = cache.load_from_snapshot(vec![
            ("patience".to_string(), vec![1.0]),
            ("gratitude".to_string(), vec![2.0]),
        ]);

        assert_eq!(loaded, 2);
        assert_eq!(cache.get("Patience"), Some(vec![1.0]));
        assert_eq!(cache.get("gratitude "), Some(vec![2.0]));
    }

    #[tokio::test]
    async fn test_load_from_snapshot_respects_capacity() {
        let cache = cache(2, 60);
        cache.set("existing", vec![0.0]);

        let loaded = cache.load_from_snapshot(vec![
            ("a".to_string(), vec![1.0]),
            ("b".to_string(), vec![2.0]),
            ("c".to_string(), vec![3.0]),
        ]);

        assert_eq!(loaded, 3);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("existing"), None);
        assert_eq!(cache.get("c"), Some(vec![3.0]));
    }

    #[tokio::test]
    async fn test_clear_and_stats() {
        let cache = cache(5, 120);
        cache.set("a", vec![1.0]);
        cache.set("b", vec![2.0]);
        cache.get("a");

        let stats = cache.stats();
        assert_eq!(stats.size, 2);
        assert_eq!(stats.max_size, 5);
        assert_eq!(stats.ttl_secs, 120);
        assert_eq!(stats.hits, 1);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats().max_size, 5);
    }
}
