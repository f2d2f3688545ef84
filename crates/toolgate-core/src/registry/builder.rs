//! Fluent construction of tool definitions

use std::time::Duration;

use super::types::{ToolCacheMetadata, ToolDefinition, ToolParameter};
use crate::engine::SharedHandler;
use crate::error::{ToolgateError, ToolgateResult};

/// Builder for [`ToolDefinition`]
///
/// ```ignore
/// let tool = ToolBuilder::new("word_count")
///     .description("Count words in a text")
///     .string_param("text", "Text to count", true)
///     .cacheable(Duration::from_secs(300))
///     .handler(handler_fn(count_words))
///     .build()?;
/// ```
#[derive(Default)]
pub struct ToolBuilder {
    name: String,
    description: String,
    parameters: Vec<ToolParameter>,
    streaming: bool,
    cache: ToolCacheMetadata,
    handler: Option<SharedHandler>,
}

impl ToolBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add a fully specified parameter
    pub fn param(mut self, param: ToolParameter) -> Self {
        self.parameters.push(param);
        self
    }

    pub fn string_param(self, name: &str, description: &str, required: bool) -> Self {
        self.param(required_or_optional(ToolParameter::string(name, description), required))
    }

    pub fn integer_param(self, name: &str, description: &str, required: bool) -> Self {
        self.param(required_or_optional(ToolParameter::integer(name, description), required))
    }

    pub fn boolean_param(self, name: &str, description: &str, required: bool) -> Self {
        self.param(required_or_optional(ToolParameter::boolean(name, description), required))
    }

    pub fn enum_param(self, name: &str, description: &str, values: &[&str], required: bool) -> Self {
        let param = ToolParameter::string(name, description).with_enum(values.iter().copied());
        self.param(required_or_optional(param, required))
    }

    /// Mark the tool as publishing incremental events
    pub fn streaming(mut self) -> Self {
        self.streaming = true;
        self
    }

    /// Opt into response caching, optionally with a tool-specific TTL
    pub fn cacheable(mut self, ttl: impl Into<Option<Duration>>) -> Self {
        self.cache.cacheable = true;
        self.cache.ttl = ttl.into();
        self
    }

    pub fn non_cacheable(mut self) -> Self {
        self.cache.cacheable = false;
        self.cache.ttl = None;
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.cache.tags.insert(tag.into());
        self
    }

    pub fn handler(mut self, handler: SharedHandler) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn build(self) -> ToolgateResult<ToolDefinition> {
        if self.name.trim().is_empty() {
            return Err(ToolgateError::config("tool name must not be empty"));
        }
        let handler = self
            .handler
            .ok_or_else(|| ToolgateError::tool(&self.name, "no handler configured"))?;

        Ok(ToolDefinition {
            name: self.name,
            description: self.description,
            parameters: self.parameters,
            streaming: self.streaming,
            cache: self.cache,
            handler,
        })
    }
}

fn required_or_optional(param: ToolParameter, required: bool) -> ToolParameter {
    if required { param } else { param.optional() }
}
