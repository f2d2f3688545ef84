//! Handler trait implemented by every tool

use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

use super::emitter::SharedEmitter;
use crate::error::ToolError;

/// A tool implementation.
///
/// Streaming tools publish through `emitter` and usually return `Value::Null`;
/// unary tools simply return their result.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, args: Value, emitter: SharedEmitter) -> Result<Value, ToolError>;
}

/// Shared handler reference
pub type SharedHandler = Arc<dyn ToolHandler>;

/// Adapter turning a closure into a [`ToolHandler`]
pub struct FnHandler<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> ToolHandler for FnHandler<F>
where
    F: Fn(Value, SharedEmitter) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, ToolError>> + Send,
{
    async fn call(&self, args: Value, emitter: SharedEmitter) -> Result<Value, ToolError> {
        (self.f)(args, emitter).await
    }
}

/// Wrap a closure as a shared handler
pub fn handler_fn<F, Fut>(f: F) -> SharedHandler
where
    F: Fn(Value, SharedEmitter) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, ToolError>> + Send + 'static,
{
    Arc::new(FnHandler { f })
}
