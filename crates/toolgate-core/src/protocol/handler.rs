//! Request routing with cache integration

use serde_json::{Map, Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use super::errors::RpcError;
use super::types::{
    JSONRPC_VERSION, JsonRpcRequest, JsonRpcResponse, MCP_PROTOCOL_VERSION, RequestId,
    ToolCallResult, ToolInfo,
};
use crate::cache::{CacheConfig, CacheStats, KeyGenerator, NoOpCache, SharedCache};
use crate::engine::{EventStream, Executor};
use crate::events::EventPayload;
use crate::registry::{SharedValidator, ToolDefinition, ToolRegistry};

/// Name and version reported by `initialize`
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: "toolgate".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Routes JSON-RPC requests to tools.
///
/// Cacheable tools are served from the cache when possible; everything else
/// runs through the [`Executor`].
pub struct ProtocolHandler {
    registry: Arc<ToolRegistry>,
    executor: Executor,
    cache: SharedCache,
    cache_config: CacheConfig,
    keys: KeyGenerator,
    validator: Option<SharedValidator>,
    server_info: ServerInfo,
}

impl ProtocolHandler {
    /// Handler with caching disabled
    pub fn new(registry: Arc<ToolRegistry>, executor: Executor) -> Self {
        Self {
            registry,
            executor,
            cache: Arc::new(NoOpCache::new()),
            cache_config: CacheConfig::default(),
            keys: KeyGenerator::new(),
            validator: None,
            server_info: ServerInfo::default(),
        }
    }

    pub fn with_cache(mut self, cache: SharedCache, config: CacheConfig) -> Self {
        self.cache = cache;
        self.cache_config = config;
        self
    }

    pub fn with_validator(mut self, validator: SharedValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn with_server_info(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.server_info = ServerInfo {
            name: name.into(),
            version: version.into(),
        };
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Release the cache and stop its background sweeper
    pub async fn close(&self) {
        if let Err(e) = self.cache.close().await {
            warn!(error = %e, "failed to close cache");
        }
    }

    /// Handle one raw message. Returns the serialized response, or `None`
    /// for notifications.
    pub async fn handle_bytes(&self, data: &[u8], cancel: &CancellationToken) -> Option<Vec<u8>> {
        let response = match parse_request(data) {
            Ok(request) => self.handle(request, cancel).await?,
            Err(response) => response,
        };

        match serde_json::to_vec(&response) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(error = %e, "failed to serialize response");
                let fallback = JsonRpcResponse::error(
                    response.id,
                    RpcError::internal_error("failed to serialize response"),
                );
                serde_json::to_vec(&fallback).ok()
            }
        }
    }

    /// Dispatch a parsed request
    pub async fn handle(
        &self,
        request: JsonRpcRequest,
        cancel: &CancellationToken,
    ) -> Option<JsonRpcResponse> {
        debug!(method = %request.method, id = ?request.id, "handling request");

        let result = if request.jsonrpc != JSONRPC_VERSION {
            Err(RpcError::invalid_request(format!(
                "unsupported jsonrpc version '{}'",
                request.jsonrpc
            )))
        } else {
            let params = request.params.unwrap_or(Value::Null);
            match request.method.as_str() {
                "initialize" => Ok(self.initialize_result()),
                "ping" => Ok(json!({})),
                "tools/list" => Ok(self.tools_list()),
                "tools/call" => self.tools_call(params, cancel).await,
                "cache/stats" => serde_json::to_value(self.cache.stats())
                    .map_err(|e| RpcError::internal_error(e.to_string())),
                other if other.starts_with("notifications/") => Ok(Value::Null),
                other => Err(RpcError::method_not_found(other)),
            }
        };

        let id = request.id?;
        Some(JsonRpcResponse::from_result(Some(id), result))
    }

    fn initialize_result(&self) -> Value {
        json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "serverInfo": {
                "name": self.server_info.name,
                "version": self.server_info.version,
            },
            "capabilities": {
                "tools": { "listChanged": false },
                "experimental": {
                    "streaming": true,
                    "cache": self.cache_config.enabled,
                }
            }
        })
    }

    fn tools_list(&self) -> Value {
        let tools: Vec<ToolInfo> = self
            .registry
            .list()
            .iter()
            .map(|tool| ToolInfo {
                name: tool.name.clone(),
                description: tool.description.clone(),
                input_schema: tool.input_schema(),
            })
            .collect();
        json!({ "tools": tools })
    }

    async fn tools_call(&self, params: Value, cancel: &CancellationToken) -> Result<Value, RpcError> {
        let Value::Object(params) = params else {
            return Err(RpcError::invalid_params("params must be an object"));
        };
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| RpcError::invalid_params("missing or invalid 'name' parameter"))?;
        let args = match params.get("arguments") {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(args @ Value::Object(_)) => args.clone(),
            Some(_) => return Err(RpcError::invalid_params("'arguments' must be an object")),
        };

        let tool = self
            .registry
            .get(name)
            .ok_or_else(|| RpcError::invalid_params(format!("tool not found: {}", name)))?;

        let credentials = params.get("_meta").and_then(|meta| meta.get("credentials"));
        self.check_credentials(&tool.name, credentials).await;

        if tool.is_cacheable() {
            self.call_cached(&tool, args, cancel).await
        } else {
            self.call_uncached(&tool, args, cancel).await
        }
    }

    async fn check_credentials(&self, tool_name: &str, credentials: Option<&Value>) {
        if let Some(validator) = &self.validator {
            if let Err(reason) = validator.validate(tool_name, credentials).await {
                warn!(tool = tool_name, %reason, "credential validation failed, continuing");
            }
        }
    }

    async fn call_cached(
        &self,
        tool: &ToolDefinition,
        args: Value,
        cancel: &CancellationToken,
    ) -> Result<Value, RpcError> {
        let key = match self.keys.generate(&tool.name, &args) {
            Ok(key) => key,
            Err(e) => {
                warn!(tool = %tool.name, error = %e, "cache key generation failed, executing without cache");
                return self.call_uncached(tool, args, cancel).await;
            }
        };

        match self.cache.get(&key).await {
            Ok(entry) => match entry.decode::<Value>() {
                Ok(value) => {
                    debug!(
                        tool = %tool.name,
                        key = %key,
                        hits = entry.hits,
                        age_ms = entry.age().as_millis() as u64,
                        "cache hit"
                    );
                    return Ok(value);
                }
                Err(e) => {
                    warn!(tool = %tool.name, error = %e, "cached entry unreadable, executing");
                }
            },
            Err(e) if e.is_miss() => debug!(tool = %tool.name, key = %key, "cache miss"),
            Err(e) => warn!(tool = %tool.name, error = %e, "cache lookup failed, executing"),
        }

        let result = self.call_uncached(tool, args, cancel).await?;

        match serde_json::to_vec(&result) {
            Ok(bytes) => {
                let ttl = self.ttl_for(tool);
                match self.cache.set(&key, bytes, ttl).await {
                    Ok(()) => debug!(tool = %tool.name, key = %key, ttl_ms = ttl.as_millis() as u64, "cached result"),
                    Err(e) => warn!(tool = %tool.name, error = %e, "failed to cache result"),
                }
            }
            Err(e) => warn!(tool = %tool.name, error = %e, "failed to serialize result for caching"),
        }

        Ok(result)
    }

    /// Tool metadata TTL, then configured override; zero selects the store default
    fn ttl_for(&self, tool: &ToolDefinition) -> Duration {
        tool.cache
            .ttl
            .or_else(|| self.cache_config.tool_ttl(&tool.name))
            .unwrap_or(Duration::ZERO)
    }

    /// Run the tool to completion and wrap its outcome as a tool-call result
    async fn call_uncached(
        &self,
        tool: &ToolDefinition,
        args: Value,
        cancel: &CancellationToken,
    ) -> Result<Value, RpcError> {
        let request_id = Uuid::new_v4().to_string();
        let mut stream = self.executor.execute(
            cancel.child_token(),
            &tool.name,
            request_id,
            args,
            tool.handler.clone(),
        );

        let mut chunks = Vec::new();
        while let Some(event) = stream.recv().await {
            match event.payload {
                EventPayload::Data(data) => chunks.push(data.chunk),
                EventPayload::End(end) => {
                    let value = match end.result {
                        Some(value) => value,
                        None if chunks.is_empty() => Value::Null,
                        None => Value::Array(chunks),
                    };
                    return serde_json::to_value(ToolCallResult::from_value(&value))
                        .map_err(|e| RpcError::internal_error(e.to_string()));
                }
                EventPayload::Error(err) => {
                    return Err(RpcError::tool_failed(err.message, err.retryable));
                }
                _ => {}
            }
        }

        Err(RpcError::internal_error(
            "event stream closed without a terminal event",
        ))
    }

    /// Start a streaming invocation and hand back its raw event stream.
    /// Streaming calls never touch the cache.
    pub fn stream_tool(
        &self,
        name: &str,
        args: Value,
        request_id: impl Into<String>,
        cancel: &CancellationToken,
    ) -> Result<EventStream, RpcError> {
        let tool = self
            .registry
            .get(name)
            .ok_or_else(|| RpcError::invalid_params(format!("tool not found: {}", name)))?;
        if !tool.streaming {
            return Err(RpcError::invalid_params(format!(
                "tool '{}' does not support streaming",
                name
            )));
        }

        Ok(self.executor.execute(
            cancel.child_token(),
            &tool.name,
            request_id,
            args,
            tool.handler.clone(),
        ))
    }
}

/// Parse raw bytes into a request, or produce the error response to send
fn parse_request(data: &[u8]) -> Result<JsonRpcRequest, JsonRpcResponse> {
    let value: Value = serde_json::from_slice(data)
        .map_err(|e| JsonRpcResponse::error(None, RpcError::parse_error(e)))?;

    let id = value
        .get("id")
        .and_then(|id| serde_json::from_value::<RequestId>(id.clone()).ok());

    if !value.is_object() {
        return Err(JsonRpcResponse::error(
            id,
            RpcError::invalid_request("request must be a JSON object"),
        ));
    }

    serde_json::from_value(value)
        .map_err(|e| JsonRpcResponse::error(id, RpcError::invalid_request(e.to_string())))
}
