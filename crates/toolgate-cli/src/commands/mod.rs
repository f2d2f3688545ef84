//! CLI commands

pub mod call;
pub mod serve;
pub mod stream;
pub mod tools;

use anyhow::{Context, bail};
use serde_json::Value;

/// Parse `--args`; only JSON objects are accepted
pub(crate) fn parse_args(raw: &str) -> anyhow::Result<Value> {
    let value: Value = serde_json::from_str(raw).context("--args must be valid JSON")?;
    if !value.is_object() {
        bail!("--args must be a JSON object, got {}", raw);
    }
    Ok(value)
}
