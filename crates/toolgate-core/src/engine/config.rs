//! Configuration, state and statistics for the executor

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::error::{ToolgateError, ToolgateResult};

/// Configuration for the executor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Capacity of each invocation's event queue
    pub buffer_size: usize,
    /// Hard per-invocation deadline
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Maximum Data/Progress events a single invocation may emit
    pub max_events: u64,
    /// Maximum number of invocations running at once
    pub max_concurrent: usize,
    /// How long Start/End/Error delivery may wait on a full queue
    #[serde(with = "humantime_serde")]
    pub terminal_event_timeout: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            buffer_size: 100,
            timeout: Duration::from_secs(300),
            max_events: 10_000,
            max_concurrent: 16,
            terminal_event_timeout: Duration::from_secs(5),
        }
    }
}

impl ExecutorConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    pub fn with_max_events(mut self, max_events: u64) -> Self {
        self.max_events = max_events;
        self
    }

    /// Reject values that would make the executor unusable
    pub fn validate(&self) -> ToolgateResult<()> {
        if self.max_concurrent == 0 {
            return Err(ToolgateError::config("executor max_concurrent must be positive"));
        }
        if self.buffer_size == 0 {
            return Err(ToolgateError::config("executor buffer_size must be positive"));
        }
        if self.timeout.is_zero() {
            return Err(ToolgateError::config("executor timeout must be non-zero"));
        }
        Ok(())
    }
}

/// Lifecycle state of one invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutorState {
    Init,
    Running,
    Done,
    Error,
    Canceled,
}

impl ExecutorState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error | Self::Canceled)
    }
}

impl fmt::Display for ExecutorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Init => "init",
            Self::Running => "running",
            Self::Done => "done",
            Self::Error => "error",
            Self::Canceled => "canceled",
        };
        f.write_str(s)
    }
}

/// Executor statistics
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutorStats {
    pub total_executions: u64,
    pub successful_executions: u64,
    pub failed_executions: u64,
    pub cancellations: u64,
    pub timeouts: u64,
    pub dropped_events: u64,
    /// Invocations currently holding an admission slot
    pub running: usize,
}
