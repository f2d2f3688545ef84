//! Toolgate core
//!
//! Runtime for serving named tools over JSON-RPC:
//!
//! - [`engine`]: bounded-concurrency streaming executor and handler emitter
//! - [`cache`]: response cache (LRU + TTL store, deterministic keys)
//! - [`protocol`]: request routing with cache integration, SSE mapping
//! - [`registry`]: tool definitions and the tool registry
//! - [`transport`]: stdio, SSE and HTTP transports

pub mod cache;
mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod logging;
pub mod protocol;
pub mod registry;
pub mod transport;

pub use cache::{Cache, CacheConfig, CacheStats, KeyGenerator, SharedCache, create_cache};
pub use config::{LogFormat, LoggingConfig, ServerConfig};
pub use engine::{
    Emitter, EventStream, Executor, ExecutorConfig, ExecutorState, SharedEmitter, ToolHandler,
    handler_fn,
};
pub use error::{CacheError, EmitError, ToolError, ToolgateError, ToolgateResult};
pub use events::{Event, EventKind, EventPayload};
pub use protocol::{JsonRpcRequest, JsonRpcResponse, ProtocolHandler, RpcError};
pub use registry::{ToolBuilder, ToolDefinition, ToolRegistry};
pub use transport::HttpConfig;
