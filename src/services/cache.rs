use moka::future::Cache;
use moka::Expiry;
use serde::{Deserialize, Serialize};
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Default TTL for postal code → coordinate lookups
pub const COORDINATE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default TTL for routed distance lookups
pub const ROUTE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default TTL for the full catalog snapshot
pub const CATALOG_TTL: Duration = Duration::from_secs(60 * 60);

const DEFAULT_MAX_ENTRIES: u64 = 10_000;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    ttl: Duration,
}

/// Expires each entry after its own TTL, measured from the latest insert
struct PerEntryTtl;

impl<K, V> Expiry<K, CacheEntry<V>> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &K,
        entry: &CacheEntry<V>,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &K,
        entry: &CacheEntry<V>,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// Thread-safe in-process cache with a TTL per entry
///
/// Cloning is cheap and clones share the same backing store, so one
/// instance can be handed to every component that needs it. Reads past
/// expiry behave as misses; expired entries are dropped lazily.
#[derive(Clone)]
pub struct TtlCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    inner: Cache<K, CacheEntry<V>>,
    default_ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(default_ttl: Duration) -> Self {
        Self::with_capacity(DEFAULT_MAX_ENTRIES, default_ttl)
    }

    pub fn with_capacity(max_entries: u64, default_ttl: Duration) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_entries)
            .expire_after(PerEntryTtl)
            .build();

        Self { inner, default_ttl }
    }

    /// Get a live value, if any
    pub async fn get(&self, key: &K) -> Option<V> {
        let hit = self.inner.get(key).await.map(|entry| entry.value);
        tracing::trace!("Cache {}", if hit.is_some() { "hit" } else { "miss" });
        hit
    }

    /// Insert with the cache's default TTL
    pub async fn insert(&self, key: K, value: V) {
        self.set(key, value, self.default_ttl).await;
    }

    /// Insert or replace with an explicit TTL
    pub async fn set(&self, key: K, value: V, ttl: Duration) {
        self.inner.insert(key, CacheEntry { value, ttl }).await;
    }

    pub async fn invalidate(&self, key: &K) {
        self.inner.invalidate(key).await;
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.inner.entry_count(),
            default_ttl_secs: self.default_ttl.as_secs(),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub entry_count: u64,
    pub default_ttl_secs: u64,
}
