//! Invocation engine
//!
//! Runs tool handlers on their own tasks and converts their output into an
//! ordered stream of [`Event`](crate::events::Event)s with admission control,
//! per-invocation deadlines and cooperative cancellation.

mod config;
mod context;
mod emitter;
mod executor;
mod handler;


pub use config::{ExecutorConfig, ExecutorState, ExecutorStats};
pub use context::InvocationContext;
pub use emitter::{Emitter, SharedEmitter};
pub use executor::{EventStream, Executor};
pub use handler::{FnHandler, SharedHandler, ToolHandler, handler_fn};
