//! Tool registry

mod auth;
mod builder;
mod types;

pub use auth::{CredentialValidator, SharedValidator};
pub use builder::ToolBuilder;
pub use types::{ToolCacheMetadata, ToolDefinition, ToolParameter, input_schema};

use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Registry of available tools, built once at startup and shared read-only
#[derive(Debug, Default, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<ToolDefinition>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any tool of the same name
    pub fn register(&mut self, tool: ToolDefinition) -> Option<Arc<ToolDefinition>> {
        debug!(
            tool = %tool.name,
            streaming = tool.streaming,
            cacheable = tool.cache.cacheable,
            "registering tool"
        );
        self.tools.insert(tool.name.clone(), Arc::new(tool))
    }

    /// Chainable registration
    pub fn with_tool(mut self, tool: ToolDefinition) -> Self {
        self.register(tool);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<ToolDefinition>> {
        self.tools.get(name).cloned()
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// All tools, sorted by name
    pub fn list(&self) -> Vec<Arc<ToolDefinition>> {
        let mut tools: Vec<_> = self.tools.values().cloned().collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.list().iter().map(|t| t.name.clone()).collect()
    }

    pub fn cache_metadata(&self, name: &str) -> Option<ToolCacheMetadata> {
        self.tools.get(name).map(|t| t.cache.clone())
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::handler_fn;
    use serde_json::{Value, json};
    use std::time::Duration;

    fn noop() -> crate::engine::SharedHandler {
        handler_fn(|_args, _emitter| async move { Ok(Value::Null) })
    }

    #[test]
    fn test_builder_defaults_to_non_cacheable() {
        let tool = ToolBuilder::new("now").handler(noop()).build().unwrap();
        assert!(!tool.is_cacheable());
        assert!(!tool.streaming);
        assert_eq!(tool.cache, ToolCacheMetadata::default());
    }

    #[test]
    fn test_builder_cache_metadata() {
        let tool = ToolBuilder::new("word_count")
            .cacheable(Duration::from_secs(300))
            .tag("text")
            .handler(noop())
            .build()
            .unwrap();

        assert!(tool.is_cacheable());
        assert_eq!(tool.cache.ttl_or(Duration::from_secs(60)), Duration::from_secs(300));
        assert!(tool.cache.tags.contains("text"));

        let untimed = ToolBuilder::new("echo")
            .cacheable(None)
            .handler(noop())
            .build()
            .unwrap();
        assert_eq!(untimed.cache.ttl_or(Duration::from_secs(60)), Duration::from_secs(60));
    }

    #[test]
    fn test_builder_requires_handler_and_name() {
        assert!(ToolBuilder::new("orphan").build().is_err());
        assert!(ToolBuilder::new("  ").handler(noop()).build().is_err());
    }

    #[test]
    fn test_input_schema() {
        let tool = ToolBuilder::new("search")
            .description("Search things")
            .string_param("query", "What to look for", true)
            .integer_param("limit", "Maximum results", false)
            .enum_param("order", "Sort order", &["asc", "desc"], false)
            .handler(noop())
            .build()
            .unwrap();

        assert_eq!(
            tool.input_schema(),
            json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "What to look for"},
                    "limit": {"type": "integer", "description": "Maximum results"},
                    "order": {"type": "string", "description": "Sort order", "enum": ["asc", "desc"]}
                },
                "required": ["query"]
            })
        );
    }

    #[test]
    fn test_registry_lists_sorted() {
        let mut registry = ToolRegistry::new();
        for name in ["zeta", "alpha", "mid"] {
            registry.register(ToolBuilder::new(name).handler(noop()).build().unwrap());
        }

        assert_eq!(registry.tool_names(), vec!["alpha", "mid", "zeta"]);
        assert!(registry.has_tool("mid"));
        assert!(registry.get("missing").is_none());
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_register_replaces_existing() {
        let mut registry = ToolRegistry::new();
        registry.register(ToolBuilder::new("echo").handler(noop()).build().unwrap());
        let previous = registry.register(
            ToolBuilder::new("echo")
                .cacheable(None)
                .handler(noop())
                .build()
                .unwrap(),
        );

        assert!(previous.is_some());
        assert_eq!(registry.len(), 1);
        assert!(registry.cache_metadata("echo").unwrap().cacheable);
    }
}
