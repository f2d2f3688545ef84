//! Tests for the event model

use super::*;
use serde_json::json;
use std::time::Duration;

#[test]
fn test_progress_percentage() {
    let event = Event::progress(25, 100, "quarter", 1);
    match event.payload {
        EventPayload::Progress(p) => {
            assert_eq!(p.percentage, 25.0);
            assert_eq!(p.message, "quarter");
        }
        other => panic!("unexpected payload: {:?}", other),
    }
}

#[test]
fn test_progress_zero_total() {
    let event = Event::progress(5, 0, "", 1);
    match event.payload {
        EventPayload::Progress(p) => assert_eq!(p.percentage, 0.0),
        other => panic!("unexpected payload: {:?}", other),
    }
}

#[test]
fn test_event_kinds() {
    assert_eq!(Event::start("t", "r", json!({})).kind(), EventKind::Start);
    assert_eq!(Event::data(json!(1), 1).kind(), EventKind::Data);
    assert_eq!(
        Event::end(Duration::from_millis(5), 0, None, None).kind(),
        EventKind::End
    );
    assert!(Event::error("boom", false).is_terminal());
    assert!(!Event::data(json!(1), 1).is_terminal());
}

#[test]
fn test_payload_serializes_untagged() {
    let event = Event::data(json!({"line": "hello"}), 3);
    let value = serde_json::to_value(&event.payload).unwrap();
    assert_eq!(value, json!({"chunk": {"line": "hello"}, "sequence": 3}));

    let end = Event::end(Duration::from_millis(1500), 4, Some("done".into()), None);
    let value = serde_json::to_value(&end.payload).unwrap();
    assert_eq!(
        value,
        json!({"duration_ms": 1500, "event_count": 4, "summary": "done"})
    );
}

#[test]
fn test_error_payload_fields() {
    let value = serde_json::to_value(&Event::error("failed", true).payload).unwrap();
    assert_eq!(value, json!({"message": "failed", "retryable": true}));
}

#[test]
fn test_kind_wire_names() {
    assert_eq!(EventKind::Progress.to_string(), "progress");
    assert_eq!(EventKind::Error.as_str(), "error");
}
