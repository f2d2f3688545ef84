//! File-based configuration loading

use std::fs;
use std::path::Path;

use super::ServerConfig;
use crate::error::{ToolgateError, ToolgateResult};

/// Load configuration from a file
///
/// The format follows the extension: YAML (`.yaml`/`.yml`), TOML (`.toml`),
/// JSON otherwise. A missing file yields the defaults.
pub fn load_from_file(path: &Path) -> ToolgateResult<ServerConfig> {
    if !path.exists() {
        return Ok(ServerConfig::default());
    }

    let content = fs::read_to_string(path).map_err(|e| {
        ToolgateError::config(format!(
            "failed to read config file '{}': {}",
            path.display(),
            e
        ))
    })?;

    let config = match path.extension().and_then(|s| s.to_str()) {
        Some("toml") => toml::from_str(&content).map_err(|e| {
            ToolgateError::config(format!("failed to parse TOML config '{}': {}", path.display(), e))
        })?,
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content).map_err(|e| {
            ToolgateError::config(format!("failed to parse YAML config '{}': {}", path.display(), e))
        })?,
        _ => serde_json::from_str(&content).map_err(|e| {
            ToolgateError::config(format!("failed to parse JSON config '{}': {}", path.display(), e))
        })?,
    };

    Ok(config)
}
