//! Handler-facing event emitter

use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::debug;

use super::context::InvocationContext;
use crate::error::EmitError;
use crate::events::Event;

/// Capability given to a running handler for publishing intermediate events.
///
/// Emission never blocks. When the consumer lags the event is dropped and
/// `EmitError::ChannelFull` is returned so the handler may react.
pub trait Emitter: Send + Sync {
    /// Publish a data chunk
    fn emit_data(&self, chunk: Value) -> Result<(), EmitError>;

    /// Publish a progress update
    fn emit_progress(&self, current: u64, total: u64, message: &str) -> Result<(), EmitError>;

    /// Cancellation scope of the invocation
    fn context(&self) -> &InvocationContext;
}

/// Shared emitter reference
pub type SharedEmitter = Arc<dyn Emitter>;

/// Emitter backed by the invocation's bounded event queue
pub(crate) struct ChannelEmitter {
    ctx: InvocationContext,
    sender: RwLock<Option<mpsc::Sender<Event>>>,
    sequence: AtomicU64,
    delivered: AtomicU64,
    max_events: u64,
    dropped: Arc<AtomicU64>,
}

impl ChannelEmitter {
    pub(crate) fn new(
        ctx: InvocationContext,
        sender: mpsc::Sender<Event>,
        max_events: u64,
        dropped: Arc<AtomicU64>,
    ) -> Self {
        Self {
            ctx,
            sender: RwLock::new(Some(sender)),
            sequence: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            max_events,
            dropped,
        }
    }

    /// Refuse further emission and release the queue handle.
    ///
    /// Handlers that keep the emitter alive past their return can no longer
    /// hold the event stream open.
    pub(crate) fn close(&self) {
        self.sender.write().take();
    }

    /// Number of Data/Progress events that reached the queue
    pub(crate) fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Acquire)
    }

    fn publish(&self, build: impl FnOnce(u64) -> Event) -> Result<(), EmitError> {
        let guard = self.sender.read();
        let sender = guard.as_ref().ok_or(EmitError::Closed)?;

        if self.ctx.is_cancelled() {
            return Err(EmitError::Cancelled);
        }
        if self.delivered.load(Ordering::Acquire) >= self.max_events {
            return Err(EmitError::LimitExceeded(self.max_events));
        }

        let sequence = self.sequence.fetch_add(1, Ordering::AcqRel) + 1;
        match sender.try_send(build(sequence)) {
            Ok(()) => {
                self.delivered.fetch_add(1, Ordering::AcqRel);
                Ok(())
            }
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                debug!(
                    tool = self.ctx.tool_name(),
                    request_id = self.ctx.request_id(),
                    sequence,
                    "event queue full, dropping event"
                );
                Err(EmitError::ChannelFull)
            }
            Err(TrySendError::Closed(_)) => Err(EmitError::ChannelClosed),
        }
    }
}

impl Emitter for ChannelEmitter {
    fn emit_data(&self, chunk: Value) -> Result<(), EmitError> {
        self.publish(|sequence| Event::data(chunk, sequence))
    }

    fn emit_progress(&self, current: u64, total: u64, message: &str) -> Result<(), EmitError> {
        self.publish(|sequence| Event::progress(current, total, message, sequence))
    }

    fn context(&self) -> &InvocationContext {
        &self.ctx
    }
}
