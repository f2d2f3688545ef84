//! Streaming executor: runs one handler per invocation and turns its work
//! into an ordered event stream.

use futures::{FutureExt, Stream};
use parking_lot::Mutex;
use serde_json::Value;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::{Semaphore, mpsc};
use tokio::time::{Instant, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::config::{ExecutorConfig, ExecutorState, ExecutorStats};
use super::context::InvocationContext;
use super::emitter::{ChannelEmitter, SharedEmitter};
use super::handler::SharedHandler;
use crate::clock::deadline_after;
use crate::error::ToolError;
use crate::events::Event;

#[derive(Debug, Default)]
struct Counters {
    total: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    cancellations: AtomicU64,
    timeouts: AtomicU64,
}

/// Runs tool handlers under admission control, deadlines and cancellation
#[derive(Clone)]
pub struct Executor {
    config: ExecutorConfig,
    semaphore: Arc<Semaphore>,
    counters: Arc<Counters>,
    dropped_events: Arc<AtomicU64>,
}

impl Executor {
    pub fn new(config: ExecutorConfig) -> Self {
        let permits = config.max_concurrent.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(permits)),
            config,
            counters: Arc::new(Counters::default()),
            dropped_events: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Start an invocation and return its event stream immediately.
    ///
    /// The handler runs on its own task once an admission slot is free.
    /// The stream yields `Start`, any `Data`/`Progress`, then exactly one
    /// `End` or `Error`, and is closed afterwards. If `cancel` fires while
    /// waiting for admission the stream carries only an `Error`.
    pub fn execute(
        &self,
        cancel: CancellationToken,
        tool_name: impl Into<String>,
        request_id: impl Into<String>,
        args: Value,
        handler: SharedHandler,
    ) -> EventStream {
        let tool_name = tool_name.into();
        let request_id = request_id.into();
        let (tx, rx) = mpsc::channel(self.config.buffer_size.max(1));
        let state = Arc::new(Mutex::new(ExecutorState::Init));

        self.counters.total.fetch_add(1, Ordering::Relaxed);
        debug!(tool = %tool_name, request_id = %request_id, "queueing invocation");

        let invocation = Invocation {
            executor: self.clone(),
            tool_name,
            request_id: request_id.clone(),
            state: state.clone(),
            tx,
        };
        tokio::spawn(invocation.run(cancel, args, handler));

        EventStream {
            receiver: rx,
            state,
            request_id,
        }
    }

    /// Snapshot of executor statistics
    pub fn stats(&self) -> ExecutorStats {
        let c = &self.counters;
        ExecutorStats {
            total_executions: c.total.load(Ordering::Relaxed),
            successful_executions: c.succeeded.load(Ordering::Relaxed),
            failed_executions: c.failed.load(Ordering::Relaxed),
            cancellations: c.cancellations.load(Ordering::Relaxed),
            timeouts: c.timeouts.load(Ordering::Relaxed),
            dropped_events: self.dropped_events.load(Ordering::Relaxed),
            running: self
                .config
                .max_concurrent
                .max(1)
                .saturating_sub(self.semaphore.available_permits()),
        }
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new(ExecutorConfig::default())
    }
}

struct Invocation {
    executor: Executor,
    tool_name: String,
    request_id: String,
    state: Arc<Mutex<ExecutorState>>,
    tx: mpsc::Sender<Event>,
}

impl Invocation {
    async fn run(self, cancel: CancellationToken, args: Value, handler: SharedHandler) {
        let semaphore = self.executor.semaphore.clone();
        let _permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                self.finish(ExecutorState::Canceled);
                self.executor.counters.cancellations.fetch_add(1, Ordering::Relaxed);
                debug!(tool = %self.tool_name, request_id = %self.request_id, "cancelled before admission");
                self.deliver(Event::error("invocation cancelled before it started", false)).await;
                return;
            }
            permit = semaphore.acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => {
                    self.finish(ExecutorState::Error);
                    self.executor.counters.failed.fetch_add(1, Ordering::Relaxed);
                    self.deliver(Event::error("executor is shut down", false)).await;
                    return;
                }
            },
        };

        self.finish(ExecutorState::Running);
        let started = Instant::now();
        let limit = self.executor.config.timeout;
        let deadline = deadline_after(started, limit);

        let scope = cancel.child_token();
        let _scope_guard = scope.clone().drop_guard();
        spawn_deadline_watchdog(scope.clone(), deadline);

        let ctx = InvocationContext::new(scope, deadline, &self.tool_name, &self.request_id);
        let emitter = Arc::new(ChannelEmitter::new(
            ctx.clone(),
            self.tx.clone(),
            self.executor.config.max_events,
            self.executor.dropped_events.clone(),
        ));

        self.deliver(Event::start(&self.tool_name, &self.request_id, args.clone()))
            .await;

        let shared: SharedEmitter = emitter.clone();
        let outcome = AssertUnwindSafe(handler.call(args, shared))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(ToolError::ExecutionFailed(panic_message(panic))));

        emitter.close();
        let event_count = emitter.delivered();
        let elapsed = started.elapsed();

        let terminal = match outcome {
            Ok(value) => {
                self.finish(ExecutorState::Done);
                self.executor.counters.succeeded.fetch_add(1, Ordering::Relaxed);
                info!(
                    tool = %self.tool_name,
                    request_id = %self.request_id,
                    duration_ms = elapsed.as_millis() as u64,
                    event_count,
                    "invocation completed"
                );
                let result = (!value.is_null()).then_some(value);
                Event::end(
                    elapsed,
                    event_count,
                    Some(format!("{} completed", self.tool_name)),
                    result,
                )
            }
            Err(err) if cancel.is_cancelled() => {
                self.finish(ExecutorState::Canceled);
                self.executor.counters.cancellations.fetch_add(1, Ordering::Relaxed);
                info!(tool = %self.tool_name, request_id = %self.request_id, "invocation cancelled");
                Event::error(err.to_string(), false)
            }
            Err(_) if ctx.deadline_exceeded() => {
                self.finish(ExecutorState::Error);
                self.executor.counters.timeouts.fetch_add(1, Ordering::Relaxed);
                self.executor.counters.failed.fetch_add(1, Ordering::Relaxed);
                warn!(
                    tool = %self.tool_name,
                    request_id = %self.request_id,
                    timeout_secs = limit.as_secs(),
                    "invocation timed out"
                );
                Event::error(format!("execution timeout after {:?}", limit), false)
            }
            Err(err) => {
                self.finish(ExecutorState::Error);
                self.executor.counters.failed.fetch_add(1, Ordering::Relaxed);
                error!(
                    tool = %self.tool_name,
                    request_id = %self.request_id,
                    error = %err,
                    "invocation failed"
                );
                Event::error(err.to_string(), err.is_retryable())
            }
        };

        self.deliver(terminal).await;
    }

    fn finish(&self, state: ExecutorState) {
        *self.state.lock() = state;
    }

    /// Blocking send with a bound, used for Start and terminal events
    async fn deliver(&self, event: Event) {
        let kind = event.kind();
        let wait = self.executor.config.terminal_event_timeout;
        match timeout(wait, self.tx.send(event)).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => {
                debug!(request_id = %self.request_id, %kind, "consumer gone, event discarded");
            }
            Err(_) => {
                self.executor.dropped_events.fetch_add(1, Ordering::Relaxed);
                warn!(
                    request_id = %self.request_id,
                    %kind,
                    waited_ms = wait.as_millis() as u64,
                    "consumer stalled, lifecycle event dropped"
                );
            }
        }
    }
}

fn spawn_deadline_watchdog(scope: CancellationToken, deadline: Instant) {
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => scope.cancel(),
            _ = scope.cancelled() => {}
        }
    });
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("handler panicked: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("handler panicked: {}", s)
    } else {
        "handler panicked".to_string()
    }
}

/// Ordered, finite stream of one invocation's events
pub struct EventStream {
    receiver: mpsc::Receiver<Event>,
    state: Arc<Mutex<ExecutorState>>,
    request_id: String,
}

impl EventStream {
    /// Next event, or `None` once the stream is closed
    pub async fn recv(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }

    /// Current lifecycle state of the invocation
    pub fn state(&self) -> ExecutorState {
        *self.state.lock()
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Drain the stream to completion
    pub async fn collect_all(mut self) -> Vec<Event> {
        let mut events = Vec::new();
        while let Some(event) = self.receiver.recv().await {
            events.push(event);
        }
        events
    }

    /// Drain the stream, giving up after `limit`
    pub async fn collect_within(self, limit: Duration) -> Option<Vec<Event>> {
        timeout(limit, self.collect_all()).await.ok()
    }
}

impl Stream for EventStream {
    type Item = Event;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Event>> {
        self.receiver.poll_recv(cx)
    }
}
