//! Store used when caching is disabled

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::Cache;
use super::types::{CacheEntry, CacheStats};
use crate::error::{CacheError, CacheResult};

/// Every lookup misses and nothing is stored
#[derive(Debug, Default)]
pub struct NoOpCache {
    misses: AtomicU64,
}

impl NoOpCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Cache for NoOpCache {
    async fn get(&self, _key: &str) -> CacheResult<CacheEntry> {
        self.misses.fetch_add(1, Ordering::Relaxed);
        Err(CacheError::Disabled)
    }

    async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> CacheResult<()> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> CacheResult<()> {
        Err(CacheError::NotFound)
    }

    async fn clear(&self) -> CacheResult<()> {
        Ok(())
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            misses: self.misses.load(Ordering::Relaxed),
            ..CacheStats::default()
        }
    }

    async fn close(&self) -> CacheResult<()> {
        Ok(())
    }
}
