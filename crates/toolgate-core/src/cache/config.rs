//! Cache configuration

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crate::error::{CacheError, CacheResult};

/// Backing store for the response cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStore {
    /// Bounded in-process LRU store
    #[default]
    Memory,
    /// Durable external store; reserved, not implemented
    Durable,
}

impl fmt::Display for CacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => f.write_str("memory"),
            Self::Durable => f.write_str("durable"),
        }
    }
}

/// Configuration for response caching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Caching is strictly opt-in
    pub enabled: bool,
    pub store: CacheStore,
    /// TTL used when a tool has no override
    #[serde(with = "humantime_serde")]
    pub default_ttl: Duration,
    /// Maximum entries in the memory store
    pub max_entries: usize,
    /// Interval of the background expiry sweep; zero disables it
    #[serde(with = "humantime_serde")]
    pub cleanup_interval: Duration,
    /// TTL overrides per tool
    #[serde(with = "tool_ttls")]
    pub tool_ttls: HashMap<String, Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            store: CacheStore::Memory,
            default_ttl: Duration::from_secs(60),
            max_entries: 1000,
            cleanup_interval: Duration::from_secs(30),
            tool_ttls: HashMap::new(),
        }
    }
}

impl CacheConfig {
    /// Enabled memory cache with default limits
    pub fn memory() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    /// Set default TTL
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Set maximum entries
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Set TTL for a specific tool
    pub fn with_tool_ttl(mut self, tool: impl Into<String>, ttl: Duration) -> Self {
        self.tool_ttls.insert(tool.into(), ttl);
        self
    }

    /// Set the background sweep interval
    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    /// Configured override for a tool, if any
    pub fn tool_ttl(&self, tool_name: &str) -> Option<Duration> {
        self.tool_ttls.get(tool_name).copied()
    }

    /// TTL for a tool, falling back to the default
    pub fn ttl_for_tool(&self, tool_name: &str) -> Duration {
        self.tool_ttl(tool_name).unwrap_or(self.default_ttl)
    }

    /// Validate the configuration. A disabled cache is always valid.
    pub fn validate(&self) -> CacheResult<()> {
        if !self.enabled {
            return Ok(());
        }
        if self.max_entries == 0 {
            return Err(CacheError::InvalidConfig(
                "max_entries must be positive".to_string(),
            ));
        }
        if self.default_ttl.is_zero() {
            return Err(CacheError::InvalidConfig(
                "default_ttl must be non-zero".to_string(),
            ));
        }
        if let Some((tool, _)) = self.tool_ttls.iter().find(|(_, ttl)| ttl.is_zero()) {
            return Err(CacheError::InvalidConfig(format!(
                "ttl override for '{}' must be non-zero",
                tool
            )));
        }
        Ok(())
    }
}

/// Human-readable durations inside the per-tool map
mod tool_ttls {
    use humantime_serde::Serde;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::{BTreeMap, HashMap};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(
        map: &HashMap<String, Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let sorted: BTreeMap<&str, Serde<Duration>> = map
            .iter()
            .map(|(tool, ttl)| (tool.as_str(), Serde::from(*ttl)))
            .collect();
        sorted.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<HashMap<String, Duration>, D::Error> {
        let raw = HashMap::<String, Serde<Duration>>::deserialize(deserializer)?;
        Ok(raw
            .into_iter()
            .map(|(tool, ttl)| (tool, ttl.into_inner()))
            .collect())
    }
}
