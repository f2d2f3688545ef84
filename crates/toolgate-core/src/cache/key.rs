//! Deterministic cache keys

use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::error::CacheResult;

/// Derives fixed-length keys from a tool name and its arguments
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyGenerator;

#[derive(Serialize)]
struct KeyMaterial<'a> {
    tool: &'a str,
    args: Value,
}

impl KeyGenerator {
    pub fn new() -> Self {
        Self
    }

    /// SHA-256 hex digest of `{"tool": name, "args": canonical(args)}`.
    ///
    /// Object key order never affects the key; array order always does.
    pub fn generate(&self, tool_name: &str, args: &Value) -> CacheResult<String> {
        let material = KeyMaterial {
            tool: tool_name,
            args: canonicalize(args),
        };
        let bytes = serde_json::to_vec(&material)?;

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(format!("{:x}", hasher.finalize()))
    }

    /// Key for tools whose result does not depend on arguments
    pub fn generate_simple(&self, tool_name: &str) -> String {
        format!("tool:{}", tool_name)
    }
}

/// Recursively rebuild objects with sorted keys; arrays keep their order
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut sorted: Vec<_> = map.iter().collect();
            sorted.sort_by(|(a, _), (b, _)| a.cmp(b));

            let canonical: Map<String, Value> = sorted
                .into_iter()
                .map(|(k, v)| (k.clone(), canonicalize(v)))
                .collect();
            Value::Object(canonical)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}
