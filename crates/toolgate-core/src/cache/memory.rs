//! In-memory LRU + TTL store

use async_trait::async_trait;
use lru::LruCache;
use parking_lot::RwLock;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::Cache;
use super::types::{CacheEntry, CacheStats, Counters};
use crate::error::{CacheError, CacheResult};

struct Inner {
    entries: LruCache<String, CacheEntry>,
    counters: Counters,
}

/// Bounded in-memory store with least-recently-used eviction and lazy expiry.
///
/// The LRU list and its key index live behind one lock, so a key is never
/// visible in one and missing from the other.
pub struct MemoryCache {
    inner: RwLock<Inner>,
    default_ttl: Duration,
    max_entries: usize,
    shutdown: CancellationToken,
}

impl MemoryCache {
    pub fn new(max_entries: usize, default_ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: RwLock::new(Inner {
                entries: LruCache::new(capacity),
                counters: Counters::default(),
            }),
            default_ttl,
            max_entries: capacity.get(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Create a store with a background sweeper removing expired entries
    /// every `interval`. The sweeper stops on `close()` or when the store is
    /// dropped. Must be called inside a tokio runtime.
    pub fn with_cleanup(max_entries: usize, default_ttl: Duration, interval: Duration) -> Arc<Self> {
        let cache = Arc::new(Self::new(max_entries, default_ttl));
        if !interval.is_zero() {
            spawn_sweeper(&cache, interval);
        }
        cache
    }

    /// Remove every entry past its expiry; returns how many were removed
    pub fn clean_expired(&self) -> usize {
        let now = Instant::now();
        let mut guard = self.inner.write();
        let inner = &mut *guard;

        let expired: Vec<String> = inner
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            inner.entries.pop(key);
        }
        inner.counters.evictions += expired.len() as u64;
        expired.len()
    }

    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}

fn spawn_sweeper(cache: &Arc<MemoryCache>, interval: Duration) {
    let weak = Arc::downgrade(cache);
    let shutdown = cache.shutdown.clone();

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // First tick completes immediately
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let Some(cache) = weak.upgrade() else { break };
                    let removed = cache.clean_expired();
                    if removed > 0 {
                        debug!(removed, "swept expired cache entries");
                    }
                }
            }
        }
        debug!("cache sweeper stopped");
    });
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> CacheResult<CacheEntry> {
        let now = Instant::now();
        let mut guard = self.inner.write();
        let inner = &mut *guard;

        let expired = match inner.entries.peek(key) {
            Some(entry) => entry.is_expired_at(now),
            None => {
                inner.counters.misses += 1;
                debug!(key, "cache miss");
                return Err(CacheError::NotFound);
            }
        };

        if expired {
            inner.entries.pop(key);
            inner.counters.misses += 1;
            inner.counters.evictions += 1;
            debug!(key, "cache entry expired");
            return Err(CacheError::Expired);
        }

        // Promotes the entry to most recently used
        match inner.entries.get_mut(key) {
            Some(entry) => {
                entry.hits += 1;
                inner.counters.hits += 1;
                debug!(key, hits = entry.hits, "cache hit");
                Ok(entry.clone())
            }
            None => {
                inner.counters.misses += 1;
                Err(CacheError::NotFound)
            }
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()> {
        let ttl = if ttl.is_zero() { self.default_ttl } else { ttl };
        let entry = CacheEntry::new(key, value, ttl);

        let mut guard = self.inner.write();
        let inner = &mut *guard;

        // `push` replaces an existing key in place or returns the evicted LRU entry
        if let Some((evicted, _)) = inner.entries.push(key.to_string(), entry) {
            if evicted != key {
                inner.counters.evictions += 1;
                debug!(key = %evicted, "evicted least recently used entry");
            }
        }
        inner.counters.sets += 1;
        debug!(key, ttl_ms = ttl.as_millis() as u64, "cache set");
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        let mut guard = self.inner.write();
        match guard.entries.pop(key) {
            Some(_) => {
                guard.counters.deletes += 1;
                Ok(())
            }
            None => Err(CacheError::NotFound),
        }
    }

    async fn clear(&self) -> CacheResult<()> {
        self.inner.write().entries.clear();
        Ok(())
    }

    fn stats(&self) -> CacheStats {
        let inner = self.inner.read();
        inner
            .counters
            .snapshot(inner.entries.len(), self.max_entries)
    }

    async fn close(&self) -> CacheResult<()> {
        self.shutdown.cancel();
        self.clear().await
    }
}

impl Drop for MemoryCache {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
