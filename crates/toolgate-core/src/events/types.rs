//! Event and payload types

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// Kind of an invocation event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Start,
    Data,
    Progress,
    End,
    Error,
}

impl EventKind {
    /// Wire name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Data => "data",
            Self::Progress => "progress",
            Self::End => "end",
            Self::Error => "error",
        }
    }

    /// `End` and `Error` close an invocation
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::End | Self::Error)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of a `Start` event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StartPayload {
    pub tool_name: String,
    pub request_id: String,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub args: Value,
}

/// Payload of a `Data` event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataPayload {
    pub chunk: Value,
    pub sequence: u64,
}

/// Payload of a `Progress` event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressPayload {
    pub current: u64,
    pub total: u64,
    pub percentage: f64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub message: String,
    pub sequence: u64,
}

/// Payload of an `End` event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndPayload {
    pub duration_ms: u64,
    pub event_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Value returned by the handler, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

/// Payload of an `Error` event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorPayload {
    pub message: String,
    pub retryable: bool,
}

/// Typed payload, serialized without a tag so the wire carries only the body
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EventPayload {
    Start(StartPayload),
    Data(DataPayload),
    Progress(ProgressPayload),
    End(EndPayload),
    Error(ErrorPayload),
}

/// An immutable invocation event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub timestamp: DateTime<Utc>,
    pub payload: EventPayload,
}

impl Event {
    fn now(payload: EventPayload) -> Self {
        Self {
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Create a start event
    pub fn start(tool_name: impl Into<String>, request_id: impl Into<String>, args: Value) -> Self {
        Self::now(EventPayload::Start(StartPayload {
            tool_name: tool_name.into(),
            request_id: request_id.into(),
            args,
        }))
    }

    /// Create a data event
    pub fn data(chunk: Value, sequence: u64) -> Self {
        Self::now(EventPayload::Data(DataPayload { chunk, sequence }))
    }

    /// Create a progress event; percentage is derived from the counters
    pub fn progress(current: u64, total: u64, message: impl Into<String>, sequence: u64) -> Self {
        let percentage = if total > 0 {
            current as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        Self::now(EventPayload::Progress(ProgressPayload {
            current,
            total,
            percentage,
            message: message.into(),
            sequence,
        }))
    }

    /// Create an end event
    pub fn end(
        duration: Duration,
        event_count: u64,
        summary: Option<String>,
        result: Option<Value>,
    ) -> Self {
        Self::now(EventPayload::End(EndPayload {
            duration_ms: duration.as_millis() as u64,
            event_count,
            summary,
            result,
        }))
    }

    /// Create an error event
    pub fn error(message: impl Into<String>, retryable: bool) -> Self {
        Self::now(EventPayload::Error(ErrorPayload {
            message: message.into(),
            retryable,
        }))
    }

    /// Kind of this event
    pub fn kind(&self) -> EventKind {
        match &self.payload {
            EventPayload::Start(_) => EventKind::Start,
            EventPayload::Data(_) => EventKind::Data,
            EventPayload::Progress(_) => EventKind::Progress,
            EventPayload::End(_) => EventKind::End,
            EventPayload::Error(_) => EventKind::Error,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.kind().is_terminal()
    }

    /// Sequence number for `Data`/`Progress` events
    pub fn sequence(&self) -> Option<u64> {
        match &self.payload {
            EventPayload::Data(d) => Some(d.sequence),
            EventPayload::Progress(p) => Some(p.sequence),
            _ => None,
        }
    }
}
