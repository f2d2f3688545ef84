//! Response cache
//!
//! A pluggable store behind the [`Cache`] trait with two implementations:
//! [`MemoryCache`] (LRU + TTL) and [`NoOpCache`] (caching disabled). The
//! store is chosen once at startup by [`create_cache`].

mod config;
mod key;
mod memory;
mod noop;
mod types;


pub use config::{CacheConfig, CacheStore};
pub use key::{KeyGenerator, canonicalize};
pub use memory::MemoryCache;
pub use noop::NoOpCache;
pub use types::{CacheEntry, CacheStats};

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::error::{CacheError, CacheResult};

/// Storage capability for serialized tool results
#[async_trait]
pub trait Cache: Send + Sync {
    /// Look up a live entry. Absent and expired keys are misses
    /// (`NotFound`/`Expired`); expired entries are evicted on the way.
    async fn get(&self, key: &str) -> CacheResult<CacheEntry>;

    /// Insert or replace an entry; a zero `ttl` means the store default
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()>;

    async fn delete(&self, key: &str) -> CacheResult<()>;

    /// Drop all entries, keeping counters
    async fn clear(&self) -> CacheResult<()>;

    fn stats(&self) -> CacheStats;

    async fn close(&self) -> CacheResult<()>;
}

/// Shared cache reference
pub type SharedCache = Arc<dyn Cache>;

/// Build the cache selected by `config`.
///
/// A disabled config yields a [`NoOpCache`] without validation.
pub fn create_cache(config: &CacheConfig) -> CacheResult<SharedCache> {
    if !config.enabled {
        info!("response cache disabled");
        return Ok(Arc::new(NoOpCache::new()));
    }

    config.validate()?;

    match config.store {
        CacheStore::Memory => {
            info!(
                max_entries = config.max_entries,
                default_ttl_ms = config.default_ttl.as_millis() as u64,
                "using in-memory response cache"
            );
            let cache = if tokio::runtime::Handle::try_current().is_ok() {
                MemoryCache::with_cleanup(
                    config.max_entries,
                    config.default_ttl,
                    config.cleanup_interval,
                )
            } else {
                warn!("no async runtime, expired entries will only be evicted lazily");
                Arc::new(MemoryCache::new(config.max_entries, config.default_ttl))
            };
            Ok(cache)
        }
        CacheStore::Durable => Err(CacheError::Unsupported(config.store.to_string())),
    }
}
