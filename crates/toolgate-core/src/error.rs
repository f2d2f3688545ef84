//! Error types for toolgate

use thiserror::Error;

/// Result type alias for toolgate operations
pub type ToolgateResult<T> = Result<T, ToolgateError>;

/// Main error type for toolgate
#[derive(Error, Debug, Clone)]
pub enum ToolgateError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Cache errors
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Tool execution errors
    #[error("Tool error: {tool_name}: {message}")]
    Tool { tool_name: String, message: String },

    /// Protocol level errors (malformed requests, unknown methods)
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Invocation exceeded its deadline
    #[error("Execution timeout after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// Invocation was cancelled
    #[error("Execution was cancelled")]
    Cancelled,

    /// Generic error
    #[error("Error: {0}")]
    Other(String),
}

impl ToolgateError {
    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a new tool error
    pub fn tool(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Tool {
            tool_name: tool_name.into(),
            message: message.into(),
        }
    }

    /// Create a new protocol error
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    /// Create a new generic error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Stable code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG",
            Self::Cache(e) => e.error_code(),
            Self::Tool { .. } => "TOOL",
            Self::Protocol(_) => "PROTOCOL",
            Self::Io(_) => "IO",
            Self::Json(_) => "JSON",
            Self::Timeout { .. } => "TIMEOUT",
            Self::Cancelled => "CANCELLED",
            Self::Other(_) => "OTHER",
        }
    }
}

impl From<std::io::Error> for ToolgateError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for ToolgateError {
    fn from(error: serde_json::Error) -> Self {
        Self::Json(error.to_string())
    }
}

impl From<ToolError> for ToolgateError {
    fn from(error: ToolError) -> Self {
        match error {
            ToolError::Cancelled => Self::Cancelled,
            ToolError::NotFound(name) => Self::tool(name, "Tool not found"),
            other => Self::tool("unknown", other.to_string()),
        }
    }
}

/// Error returned by tool handlers
#[derive(Debug, Clone, Error)]
pub enum ToolError {
    /// Invalid arguments provided to the tool
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Tool execution failed
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// Tool not found
    #[error("Tool not found: {0}")]
    NotFound(String),

    /// Handler observed cancellation and gave up
    #[error("Tool execution cancelled")]
    Cancelled,

    /// Handler ran past its deadline
    #[error("Tool execution timeout")]
    Timeout,

    /// Other error
    #[error("Other error: {0}")]
    Other(String),
}

impl ToolError {
    /// Whether a caller could reasonably retry the same invocation
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidArguments(_) => "TOOL_INVALID_ARGUMENTS",
            Self::ExecutionFailed(_) => "TOOL_EXECUTION_FAILED",
            Self::NotFound(_) => "TOOL_NOT_FOUND",
            Self::Cancelled => "TOOL_CANCELLED",
            Self::Timeout => "TOOL_TIMEOUT",
            Self::Other(_) => "TOOL_OTHER",
        }
    }
}

impl From<EmitError> for ToolError {
    fn from(error: EmitError) -> Self {
        match error {
            EmitError::Cancelled => Self::Cancelled,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(error: serde_json::Error) -> Self {
        Self::InvalidArguments(error.to_string())
    }
}

/// Failure to publish an intermediate event from a handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EmitError {
    /// The invocation already produced its terminal event
    #[error("emitter is closed")]
    Closed,

    /// The invocation's context was cancelled or hit its deadline
    #[error("invocation cancelled")]
    Cancelled,

    /// Consumer is not keeping up; the event was dropped
    #[error("event channel full, event dropped")]
    ChannelFull,

    /// Consumer has gone away
    #[error("event channel closed")]
    ChannelClosed,

    /// Per-invocation event cap reached
    #[error("event limit of {0} reached")]
    LimitExceeded(u64),
}

/// Cache errors
///
/// `NotFound`, `Expired` and `Disabled` are ordinary misses, not failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("cache miss: key not found")]
    NotFound,

    #[error("cache miss: entry expired")]
    Expired,

    #[error("cache disabled")]
    Disabled,

    #[error("cache serialization failed: {0}")]
    Serialization(String),

    #[error("invalid cache config: {0}")]
    InvalidConfig(String),

    #[error("unsupported cache store: {0}")]
    Unsupported(String),
}

impl CacheError {
    /// True for the outcomes that simply mean "not cached"
    pub fn is_miss(&self) -> bool {
        matches!(self, Self::NotFound | Self::Expired | Self::Disabled)
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound => "CACHE_NOT_FOUND",
            Self::Expired => "CACHE_EXPIRED",
            Self::Disabled => "CACHE_DISABLED",
            Self::Serialization(_) => "CACHE_SERIALIZATION",
            Self::InvalidConfig(_) => "CACHE_INVALID_CONFIG",
            Self::Unsupported(_) => "CACHE_UNSUPPORTED",
        }
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

/// Result type alias for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_miss_classification() {
        assert!(CacheError::NotFound.is_miss());
        assert!(CacheError::Expired.is_miss());
        assert!(CacheError::Disabled.is_miss());
        assert!(!CacheError::Serialization("bad".into()).is_miss());
    }

    #[test]
    fn test_tool_error_retryable() {
        assert!(ToolError::Timeout.is_retryable());
        assert!(!ToolError::ExecutionFailed("boom".into()).is_retryable());
    }

    #[test]
    fn test_emit_error_maps_to_tool_error() {
        assert!(matches!(
            ToolError::from(EmitError::Cancelled),
            ToolError::Cancelled
        ));
        assert!(matches!(
            ToolError::from(EmitError::Closed),
            ToolError::Other(_)
        ));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(ToolgateError::config("x").error_code(), "CONFIG");
        assert_eq!(
            ToolgateError::from(CacheError::Disabled).error_code(),
            "CACHE_DISABLED"
        );
    }
}
