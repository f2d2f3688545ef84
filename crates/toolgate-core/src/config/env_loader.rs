//! Environment variable overrides

use humantime_serde::re::humantime;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use super::{LogFormat, ServerConfig};
use crate::error::{ToolgateError, ToolgateResult};

/// Prefix shared by all recognised variables
pub const ENV_PREFIX: &str = "TOOLGATE_";

impl ServerConfig {
    /// Apply `TOOLGATE_*` overrides from the process environment
    pub fn apply_env_overrides(&mut self) -> ToolgateResult<()> {
        self.apply_env_overrides_from(|key| env::var(key).ok())
    }

    /// Apply overrides using `lookup` to resolve variable names
    pub fn apply_env_overrides_from<F>(&mut self, lookup: F) -> ToolgateResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        if let Some(value) = var("CACHE_ENABLED") {
            self.cache.enabled = parse_bool("TOOLGATE_CACHE_ENABLED", &value)?;
        }
        if let Some(value) = var("CACHE_MAX_ENTRIES") {
            self.cache.max_entries = parse("TOOLGATE_CACHE_MAX_ENTRIES", &value)?;
        }
        if let Some(value) = var("CACHE_TTL") {
            self.cache.default_ttl = parse_duration("TOOLGATE_CACHE_TTL", &value)?;
        }
        if let Some(value) = var("MAX_CONCURRENT") {
            self.executor.max_concurrent = parse("TOOLGATE_MAX_CONCURRENT", &value)?;
        }
        if let Some(value) = var("TIMEOUT") {
            self.executor.timeout = parse_duration("TOOLGATE_TIMEOUT", &value)?;
        }
        if let Some(value) = var("HTTP_ADDR") {
            self.http.address = value;
        }
        if let Some(value) = var("HTTP_MAX_REQUEST_SIZE") {
            self.http.max_request_size = parse("TOOLGATE_HTTP_MAX_REQUEST_SIZE", &value)?;
        }
        if let Some(value) = var("LOG_LEVEL") {
            self.logging.level = value;
        }
        if let Some(value) = var("LOG_FORMAT") {
            self.logging.format = LogFormat::from_str(&value)?;
        }
        Ok(())
    }
}

fn parse<T: FromStr>(name: &str, value: &str) -> ToolgateResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ToolgateError::config(format!("invalid {} value '{}'", name, value)))
}

fn parse_bool(name: &str, value: &str) -> ToolgateResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ToolgateError::config(format!(
            "invalid {} value '{}'",
            name, value
        ))),
    }
}

fn parse_duration(name: &str, value: &str) -> ToolgateResult<Duration> {
    humantime::parse_duration(value.trim())
        .map_err(|e| ToolgateError::config(format!("invalid {} value '{}': {}", name, value, e)))
}
