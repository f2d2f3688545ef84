//! Optional credential validation hook

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Consulted before a tool runs. A rejection is reported to the log but
/// does not block the call; the tool decides what an anonymous call means.
#[async_trait]
pub trait CredentialValidator: Send + Sync {
    /// `credentials` is whatever the caller put under `_meta.credentials`
    async fn validate(&self, tool_name: &str, credentials: Option<&Value>) -> Result<(), String>;
}

pub type SharedValidator = Arc<dyn CredentialValidator>;
