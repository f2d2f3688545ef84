//! JSON-RPC protocol surface
//!
//! Message types, the cache-aware request router and the SSE mapping of
//! invocation events.

mod errors;
mod handler;
pub mod sse;
mod types;


pub use errors::{
    INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR, RpcError,
};
pub use handler::{ProtocolHandler, ServerInfo};
pub use sse::{SseMessage, format_event, stream_events_to_sse};
pub use types::{
    ContentItem, JSONRPC_VERSION, JsonRpcRequest, JsonRpcResponse, MCP_PROTOCOL_VERSION,
    RequestId, ToolCallResult, ToolInfo,
};
