//! Server configuration

mod env_loader;
mod file_loader;

pub use env_loader::ENV_PREFIX;
pub use file_loader::load_from_file;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::cache::CacheConfig;
use crate::engine::ExecutorConfig;
use crate::error::{ToolgateError, ToolgateResult};
use crate::transport::HttpConfig;

/// Output format of the log subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = ToolgateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(ToolgateError::config(format!(
                "unknown log format '{}', expected pretty, compact or json",
                other
            ))),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pretty => f.write_str("pretty"),
            Self::Compact => f.write_str("compact"),
            Self::Json => f.write_str("json"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Complete server configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub cache: CacheConfig,
    pub executor: ExecutorConfig,
    pub logging: LoggingConfig,
    pub http: HttpConfig,
}

impl ServerConfig {
    /// Load from `path` (defaults when missing), then apply environment overrides
    pub fn load(path: Option<&std::path::Path>) -> ToolgateResult<Self> {
        let mut config = match path {
            Some(path) => load_from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Validate every section. A disabled cache is not validated.
    pub fn validate(&self) -> ToolgateResult<()> {
        self.cache.validate()?;
        self.executor.validate()?;
        self.http.validate()?;
        if self.logging.level.trim().is_empty() {
            return Err(ToolgateError::config("log level must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.default_ttl, Duration::from_secs(60));
        assert_eq!(config.cache.max_entries, 1000);
        assert_eq!(config.executor.max_concurrent, 16);
        assert_eq!(config.executor.buffer_size, 100);
        assert_eq!(config.executor.timeout, Duration::from_secs(300));
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.http.address, "127.0.0.1:8080");
        assert_eq!(config.http.max_request_size, 10 * 1024 * 1024);
        assert!(config.http.allowed_origins.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = load_from_file(&temp_dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn test_load_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("toolgate.yaml");
        fs::write(
            &path,
            r#"
cache:
  enabled: true
  default_ttl: 2m
  max_entries: 50
  tool_ttls:
    word_count: 10m
executor:
  max_concurrent: 4
  timeout: 30s
logging:
  format: json
"#,
        )
        .unwrap();

        let config = load_from_file(&path).unwrap();
        assert!(config.cache.enabled);
        assert_eq!(config.cache.default_ttl, Duration::from_secs(120));
        assert_eq!(config.cache.max_entries, 50);
        assert_eq!(config.cache.ttl_for_tool("word_count"), Duration::from_secs(600));
        assert_eq!(config.executor.max_concurrent, 4);
        assert_eq!(config.executor.timeout, Duration::from_secs(30));
        assert_eq!(config.executor.buffer_size, 100);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("toolgate.toml");
        fs::write(
            &path,
            r#"
[cache]
enabled = true
cleanup_interval = "10s"

[executor]
max_events = 500

[http]
address = "0.0.0.0:9000"
allowed_origins = ["*"]
"#,
        )
        .unwrap();

        let config = load_from_file(&path).unwrap();
        assert!(config.cache.enabled);
        assert_eq!(config.cache.cleanup_interval, Duration::from_secs(10));
        assert_eq!(config.executor.max_events, 500);
        assert_eq!(config.http.address, "0.0.0.0:9000");
        assert_eq!(config.http.allowed_origins, vec!["*".to_string()]);
        assert_eq!(config.http.max_request_size, 10 * 1024 * 1024);
    }

    #[test]
    fn test_load_json_and_reject_garbage() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("toolgate.json");
        fs::write(&path, r#"{"logging": {"level": "debug"}}"#).unwrap();
        assert_eq!(load_from_file(&path).unwrap().logging.level, "debug");

        fs::write(&path, "{ not json").unwrap();
        assert!(load_from_file(&path).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ServerConfig::default();
        config
            .apply_env_overrides_from(lookup(&[
                ("TOOLGATE_CACHE_ENABLED", "true"),
                ("TOOLGATE_CACHE_MAX_ENTRIES", "25"),
                ("TOOLGATE_CACHE_TTL", "90s"),
                ("TOOLGATE_MAX_CONCURRENT", "2"),
                ("TOOLGATE_TIMEOUT", "1m"),
                ("TOOLGATE_LOG_LEVEL", "debug"),
                ("TOOLGATE_LOG_FORMAT", "compact"),
                ("TOOLGATE_HTTP_ADDR", "127.0.0.1:9100"),
                ("TOOLGATE_HTTP_MAX_REQUEST_SIZE", "4096"),
            ]))
            .unwrap();

        assert!(config.cache.enabled);
        assert_eq!(config.cache.max_entries, 25);
        assert_eq!(config.cache.default_ttl, Duration::from_secs(90));
        assert_eq!(config.executor.max_concurrent, 2);
        assert_eq!(config.executor.timeout, Duration::from_secs(60));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert_eq!(config.http.address, "127.0.0.1:9100");
        assert_eq!(config.http.max_request_size, 4096);
    }

    #[test]
    fn test_invalid_env_values() {
        let mut config = ServerConfig::default();
        assert!(
            config
                .apply_env_overrides_from(lookup(&[("TOOLGATE_MAX_CONCURRENT", "many")]))
                .is_err()
        );
        assert!(
            config
                .apply_env_overrides_from(lookup(&[("TOOLGATE_CACHE_TTL", "soon")]))
                .is_err()
        );
        assert!(
            config
                .apply_env_overrides_from(lookup(&[("TOOLGATE_LOG_FORMAT", "xml")]))
                .is_err()
        );
    }

    #[test]
    fn test_validation_skips_disabled_cache() {
        let mut config = ServerConfig::default();
        config.cache.max_entries = 0;
        assert!(config.validate().is_ok());

        config.cache.enabled = true;
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.executor.max_concurrent = 0;
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.http.max_request_size = 0;
        assert!(config.validate().is_err());
    }
}
