//! Per-invocation cancellation context

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

use crate::clock::deadline_after;

/// Cancellation scope handed to a running handler through its emitter.
///
/// Carries both the caller's cancellation and the per-invocation deadline.
/// Handlers poll it between units of work; nothing is preempted.
#[derive(Debug, Clone)]
pub struct InvocationContext {
    token: CancellationToken,
    deadline: Instant,
    tool_name: Arc<str>,
    request_id: Arc<str>,
}

impl InvocationContext {
    pub(crate) fn new(
        token: CancellationToken,
        deadline: Instant,
        tool_name: &str,
        request_id: &str,
    ) -> Self {
        Self {
            token,
            deadline,
            tool_name: Arc::from(tool_name),
            request_id: Arc::from(request_id),
        }
    }

    /// Detached context, useful for driving a handler outside the executor
    pub fn detached(timeout: Duration) -> Self {
        Self::new(
            CancellationToken::new(),
            deadline_after(Instant::now(), timeout),
            "detached",
            "detached",
        )
    }

    /// True once the caller cancelled or the deadline passed
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves when the invocation should stop
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Time left before the deadline
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn deadline_exceeded(&self) -> bool {
        Instant::now() >= self.deadline
    }

    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }
}
