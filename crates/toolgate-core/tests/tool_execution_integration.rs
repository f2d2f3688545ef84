//! Integration tests for the request path: transport, routing, cache and executor

use futures::StreamExt;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use toolgate_core::cache::{CacheConfig, create_cache};
use toolgate_core::engine::{ExecutorConfig, ExecutorState};
use toolgate_core::events::EventKind;
use toolgate_core::protocol::stream_events_to_sse;
use toolgate_core::transport::{serve, write_sse};
use toolgate_core::{
    Executor, ProtocolHandler, SharedEmitter, ToolBuilder, ToolError, ToolRegistry, handler_fn,
};

// Cacheable tool that reports how often it actually ran
fn lookup_tool(calls: Arc<AtomicUsize>, ttl: Option<Duration>) -> ToolBuilder {
    ToolBuilder::new("lookup")
        .description("Looks up a key")
        .string_param("key", "Key to look up", true)
        .cacheable(ttl)
        .handler(handler_fn(move |args: Value, _emitter| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                let key = args["key"]
                    .as_str()
                    .ok_or_else(|| ToolError::InvalidArguments("key must be a string".into()))?;
                Ok(json!({ "key": key, "value": key.len() }))
            }
        }))
}

fn progress_tool() -> ToolBuilder {
    ToolBuilder::new("download")
        .description("Simulated download")
        .streaming()
        .handler(handler_fn(|_args, emitter: SharedEmitter| async move {
            for part in 1..=3u64 {
                emitter.emit_progress(part, 3, &format!("part {}", part))?;
                emitter.emit_data(json!({ "part": part }))?;
            }
            Ok(json!({ "parts": 3 }))
        }))
}

fn server(registry: ToolRegistry, cache: CacheConfig) -> ProtocolHandler {
    let store = create_cache(&cache).unwrap();
    ProtocolHandler::new(Arc::new(registry), Executor::default()).with_cache(store, cache)
}

async fn rpc(handler: &ProtocolHandler, raw: Value) -> Value {
    let bytes = serde_json::to_vec(&raw).unwrap();
    let response = handler
        .handle_bytes(&bytes, &CancellationToken::new())
        .await
        .expect("response");
    serde_json::from_slice(&response).unwrap()
}

fn call(id: i64, key: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": { "name": "lookup", "arguments": { "key": key } }
    })
}

#[tokio::test]
async fn test_repeated_call_served_from_cache() {
    let calls = Arc::new(AtomicUsize::new(0));
    let handler = server(
        ToolRegistry::new().with_tool(lookup_tool(calls.clone(), None).build().unwrap()),
        CacheConfig::memory(),
    );

    let first = rpc(&handler, call(1, "alpha")).await;
    let second = rpc(&handler, call(2, "alpha")).await;
    let other = rpc(&handler, call(3, "beta")).await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(first["result"], second["result"]);
    assert_eq!(second["id"], json!(2));
    assert_ne!(first["result"], other["result"]);

    let stats = rpc(
        &handler,
        json!({"jsonrpc": "2.0", "id": 4, "method": "cache/stats"}),
    )
    .await;
    assert_eq!(stats["result"]["hits"], json!(1));
    assert_eq!(stats["result"]["misses"], json!(2));
    assert_eq!(stats["result"]["sets"], json!(2));
    assert_eq!(stats["result"]["size"], json!(2));
}

#[tokio::test]
async fn test_argument_order_does_not_split_cache() {
    let calls = Arc::new(AtomicUsize::new(0));
    let tool = ToolBuilder::new("lookup")
        .cacheable(None)
        .handler(handler_fn({
            let calls = calls.clone();
            move |args: Value, _emitter| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(args)
                }
            }
        }))
        .build()
        .unwrap();
    let handler = server(ToolRegistry::new().with_tool(tool), CacheConfig::memory());

    let a: Value = serde_json::from_str(
        r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"lookup","arguments":{"a":1,"b":{"y":2,"x":1}}}}"#,
    )
    .unwrap();
    let b: Value = serde_json::from_str(
        r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"lookup","arguments":{"b":{"x":1,"y":2},"a":1}}}"#,
    )
    .unwrap();

    rpc(&handler, a).await;
    rpc(&handler, b).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cached_result_expires_after_tool_ttl() {
    let calls = Arc::new(AtomicUsize::new(0));
    let handler = server(
        ToolRegistry::new().with_tool(
            lookup_tool(calls.clone(), Some(Duration::from_millis(50)))
                .build()
                .unwrap(),
        ),
        CacheConfig::memory(),
    );

    rpc(&handler, call(1, "alpha")).await;
    tokio::time::advance(Duration::from_millis(20)).await;
    rpc(&handler, call(2, "alpha")).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    tokio::time::advance(Duration::from_millis(40)).await;
    rpc(&handler, call(3, "alpha")).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_failed_call_is_not_cached() {
    let calls = Arc::new(AtomicUsize::new(0));
    let handler = server(
        ToolRegistry::new().with_tool(lookup_tool(calls.clone(), None).build().unwrap()),
        CacheConfig::memory(),
    );
    let bad = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "tools/call",
        "params": { "name": "lookup", "arguments": { "key": 7 } }
    });

    let first = rpc(&handler, bad.clone()).await;
    let second = rpc(&handler, bad).await;

    assert!(first["error"].is_object());
    assert!(second["error"].is_object());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(handler.cache_stats().sets, 0);
}

#[tokio::test]
async fn test_streaming_tool_to_sse() {
    let handler = server(
        ToolRegistry::new().with_tool(progress_tool().build().unwrap()),
        CacheConfig::default(),
    );

    let stream = handler
        .stream_tool("download", json!({}), "req-42", &CancellationToken::new())
        .unwrap();
    let mut output = Vec::new();
    let written = write_sse(&mut output, stream_events_to_sse(stream, "req-42"))
        .await
        .unwrap();

    // start, three progress/data pairs, end
    assert_eq!(written, 8);
    let text = String::from_utf8(output).unwrap();
    let kinds: Vec<&str> = text
        .lines()
        .filter_map(|line| line.strip_prefix("event: "))
        .collect();
    assert_eq!(
        kinds,
        vec!["start", "progress", "data", "progress", "data", "progress", "data", "end"]
    );
    assert_eq!(text.matches("id: req-42\n").count(), 8);
    assert!(text.contains(r#""parts":3"#));
}

#[tokio::test]
async fn test_event_sequences_are_monotonic() {
    let executor = Executor::default();
    let tool = progress_tool().build().unwrap();

    let mut stream = executor.execute(
        CancellationToken::new(),
        &tool.name,
        "seq",
        json!({}),
        tool.handler.clone(),
    );
    let mut events = Vec::new();
    while let Some(event) = stream.next().await {
        events.push(event);
    }

    assert_eq!(events.first().map(|e| e.kind()), Some(EventKind::Start));
    assert_eq!(events.last().map(|e| e.kind()), Some(EventKind::End));
    let sequences: Vec<u64> = events.iter().filter_map(|e| e.sequence()).collect();
    assert_eq!(sequences, (1..=6).collect::<Vec<_>>());
    assert_eq!(stream.state(), ExecutorState::Done);
}

#[tokio::test]
async fn test_concurrency_bound_across_invocations() {
    let executor = Executor::new(ExecutorConfig::default().with_max_concurrent(2));
    let active = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let handler = handler_fn({
        let active = active.clone();
        let peak = peak.clone();
        move |_args, _emitter| {
            let active = active.clone();
            let peak = peak.clone();
            async move {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                active.fetch_sub(1, Ordering::SeqCst);
                Ok(Value::Null)
            }
        }
    });

    let streams: Vec<_> = (0..6)
        .map(|i| {
            executor.execute(
                CancellationToken::new(),
                "sleepy",
                format!("req-{}", i),
                json!({}),
                handler.clone(),
            )
        })
        .collect();

    for stream in streams {
        let events = stream.collect_all().await;
        assert_eq!(events.last().map(|e| e.kind()), Some(EventKind::End));
    }

    assert!(peak.load(Ordering::SeqCst) <= 2);
    let stats = executor.stats();
    assert_eq!(stats.total_executions, 6);
    assert_eq!(stats.successful_executions, 6);
    assert_eq!(stats.running, 0);
}

#[tokio::test]
async fn test_stdio_session() {
    let calls = Arc::new(AtomicUsize::new(0));
    let handler = Arc::new(server(
        ToolRegistry::new().with_tool(lookup_tool(calls.clone(), None).build().unwrap()),
        CacheConfig::memory(),
    ));

    let input = [
        json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}).to_string(),
        json!({"jsonrpc": "2.0", "method": "notifications/initialized"}).to_string(),
        json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}).to_string(),
        call(3, "alpha").to_string(),
        "{broken".to_string(),
    ]
    .join("\n");

    let mut output = Vec::new();
    serve(input.as_bytes(), &mut output, handler, CancellationToken::new())
        .await
        .unwrap();

    let responses: Vec<Value> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(responses.len(), 4);

    let by_id = |id: Value| responses.iter().find(|r| r["id"] == id).unwrap();
    assert_eq!(
        by_id(json!(1))["result"]["capabilities"]["experimental"]["cache"],
        json!(true)
    );
    assert_eq!(by_id(json!(2))["result"]["tools"][0]["name"], json!("lookup"));
    assert_eq!(
        by_id(json!(2))["result"]["tools"][0]["inputSchema"]["required"],
        json!(["key"])
    );
    assert!(by_id(json!(3))["result"]["content"].is_array());
    assert_eq!(by_id(Value::Null)["error"]["code"], json!(-32700));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
