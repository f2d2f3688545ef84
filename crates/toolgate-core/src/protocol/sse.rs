//! Event to Server-Sent-Events mapping

use futures::{Stream, StreamExt};

use crate::events::Event;

const SERIALIZATION_FALLBACK: &str = r#"{"error":"failed to serialize event data"}"#;

/// One SSE block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseMessage {
    pub event: Option<String>,
    pub id: Option<String>,
    pub data: String,
}

impl SseMessage {
    /// Map an event; the payload body becomes the data
    pub fn from_event(event: &Event, request_id: &str) -> Self {
        let data = serde_json::to_string(&event.payload)
            .unwrap_or_else(|_| SERIALIZATION_FALLBACK.to_string());

        Self {
            event: Some(event.kind().as_str().to_string()),
            id: (!request_id.is_empty()).then(|| request_id.to_string()),
            data,
        }
    }

    /// Render the wire block, terminated by a blank line.
    ///
    /// Every physical line of the data gets its own `data:` prefix.
    pub fn format(&self) -> String {
        let mut out = String::with_capacity(self.data.len() + 32);

        if let Some(event) = self.event.as_deref().filter(|e| !e.is_empty()) {
            out.push_str("event: ");
            out.push_str(event);
            out.push('\n');
        }
        if let Some(id) = self.id.as_deref() {
            out.push_str("id: ");
            out.push_str(id);
            out.push('\n');
        }
        for line in self.data.split('\n') {
            out.push_str("data: ");
            out.push_str(line.strip_suffix('\r').unwrap_or(line));
            out.push('\n');
        }
        out.push('\n');
        out
    }
}

/// Render a single event as an SSE block
pub fn format_event(event: &Event, request_id: &str) -> String {
    SseMessage::from_event(event, request_id).format()
}

/// Map an event stream to SSE blocks, one per event, in emission order
pub fn stream_events_to_sse<S>(events: S, request_id: impl Into<String>) -> impl Stream<Item = String>
where
    S: Stream<Item = Event>,
{
    let request_id = request_id.into();
    events.map(move |event| format_event(&event, &request_id))
}
