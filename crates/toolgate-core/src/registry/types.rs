//! Tool definition types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

use crate::engine::SharedHandler;

/// Caching policy of a tool; caching is opt-in
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCacheMetadata {
    pub cacheable: bool,
    /// Overrides the configured TTL when present
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub ttl: Option<Duration>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
}

impl ToolCacheMetadata {
    pub fn cacheable(ttl: Option<Duration>) -> Self {
        Self {
            cacheable: true,
            ttl,
            tags: BTreeSet::new(),
        }
    }

    /// The tool's own TTL, else `default`
    pub fn ttl_or(&self, default: Duration) -> Duration {
        self.ttl.unwrap_or(default)
    }
}

/// Parameter definition for a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    pub description: String,
    /// JSON schema type (string, integer, boolean, ...)
    pub param_type: String,
    pub required: bool,
    pub default: Option<Value>,
    pub enum_values: Option<Vec<Value>>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
}

impl ToolParameter {
    fn typed(name: impl Into<String>, description: impl Into<String>, param_type: &str) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            param_type: param_type.to_string(),
            required: true,
            default: None,
            enum_values: None,
            minimum: None,
            maximum: None,
        }
    }

    /// Create a required string parameter
    pub fn string(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::typed(name, description, "string")
    }

    /// Create a required integer parameter
    pub fn integer(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::typed(name, description, "integer")
    }

    /// Create a required boolean parameter
    pub fn boolean(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::typed(name, description, "boolean")
    }

    /// Make parameter optional
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_enum<V: Into<Value>>(mut self, values: impl IntoIterator<Item = V>) -> Self {
        self.enum_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_range(mut self, minimum: f64, maximum: f64) -> Self {
        self.minimum = Some(minimum);
        self.maximum = Some(maximum);
        self
    }

    fn to_schema(&self) -> Value {
        let mut schema = Map::new();
        schema.insert("type".to_string(), self.param_type.clone().into());
        schema.insert("description".to_string(), self.description.clone().into());
        if let Some(values) = &self.enum_values {
            schema.insert("enum".to_string(), Value::Array(values.clone()));
        }
        if let Some(default) = &self.default {
            schema.insert("default".to_string(), default.clone());
        }
        if let Some(min) = self.minimum {
            schema.insert("minimum".to_string(), json!(min));
        }
        if let Some(max) = self.maximum {
            schema.insert("maximum".to_string(), json!(max));
        }
        Value::Object(schema)
    }
}

/// Build the JSON input schema for a parameter list
pub fn input_schema(parameters: &[ToolParameter]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for param in parameters {
        properties.insert(param.name.clone(), param.to_schema());
        if param.required {
            required.push(Value::String(param.name.clone()));
        }
    }

    let mut schema = Map::new();
    schema.insert("type".to_string(), "object".into());
    schema.insert("properties".to_string(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert("required".to_string(), Value::Array(required));
    }
    Value::Object(schema)
}

/// A registered tool: metadata plus its handler
#[derive(Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ToolParameter>,
    /// Streaming tools publish through their emitter
    pub streaming: bool,
    pub cache: ToolCacheMetadata,
    pub handler: SharedHandler,
}

impl ToolDefinition {
    pub fn input_schema(&self) -> Value {
        input_schema(&self.parameters)
    }

    pub fn is_cacheable(&self) -> bool {
        self.cache.cacheable
    }
}

impl fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("parameters", &self.parameters)
            .field("streaming", &self.streaming)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}
