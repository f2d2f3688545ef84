//! Cache entry and statistics types

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::time::Instant;

use crate::clock::deadline_after;
use crate::error::CacheResult;

/// A stored, serialized tool result
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: String,
    /// Serialized payload
    pub value: Vec<u8>,
    pub created_at: Instant,
    /// Fixed at insertion: `created_at + ttl`, clamped for unbounded TTLs
    pub expires_at: Instant,
    /// Successful lookups of this entry
    pub hits: u64,
}

impl CacheEntry {
    pub fn new(key: impl Into<String>, value: Vec<u8>, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            key: key.into(),
            value,
            created_at: now,
            expires_at: deadline_after(now, ttl),
            hits: 0,
        }
    }

    /// An entry is expired from `expires_at` onwards
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    /// Remaining lifetime, zero once expired
    pub fn ttl_remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }

    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Deserialize the stored payload
    pub fn decode<T: DeserializeOwned>(&self) -> CacheResult<T> {
        Ok(serde_json::from_slice(&self.value)?)
    }
}

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    pub evictions: u64,
    /// Current number of entries
    pub size: usize,
    pub max_size: usize,
    /// `hits / (hits + misses)`, zero before any lookup
    pub hit_rate: f64,
}

impl CacheStats {
    pub(crate) fn compute_hit_rate(hits: u64, misses: u64) -> f64 {
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }
}

/// Raw counters shared by the store implementations
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Counters {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    pub evictions: u64,
}

impl Counters {
    pub fn snapshot(&self, size: usize, max_size: usize) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            sets: self.sets,
            deletes: self.deletes,
            evictions: self.evictions,
            size,
            max_size,
            hit_rate: CacheStats::compute_hit_rate(self.hits, self.misses),
        }
    }
}
