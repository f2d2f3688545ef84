//! Transports
//!
//! Thin wrappers feeding raw messages into the
//! [`ProtocolHandler`](crate::protocol::ProtocolHandler) and writing back
//! what it produces: newline-delimited stdio, SSE over any writer, and HTTP.

pub mod http;
pub mod sse;
pub mod stdio;

pub use http::HttpConfig;
pub use sse::write_sse;
pub use stdio::serve;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Executor, SharedEmitter, handler_fn};
    use crate::protocol::{ProtocolHandler, stream_events_to_sse};
    use crate::registry::{ToolBuilder, ToolRegistry};
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    fn handler() -> Arc<ProtocolHandler> {
        let echo = ToolBuilder::new("echo")
            .handler(handler_fn(|args: Value, _emitter| async move { Ok(args) }))
            .build()
            .unwrap();
        let ticks = ToolBuilder::new("ticks")
            .streaming()
            .handler(handler_fn(|_args, emitter: SharedEmitter| async move {
                emitter.emit_progress(1, 2, "one")?;
                emitter.emit_progress(2, 2, "two")?;
                Ok(Value::Null)
            }))
            .build()
            .unwrap();
        let registry = ToolRegistry::new().with_tool(echo).with_tool(ticks);
        Arc::new(ProtocolHandler::new(Arc::new(registry), Executor::default()))
    }

    #[tokio::test]
    async fn test_stdio_answers_each_request() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"echo","arguments":{"x":1}}}"#,
            "\n",
        );
        let mut output = Vec::new();

        serve(input.as_bytes(), &mut output, handler(), CancellationToken::new())
            .await
            .unwrap();

        let responses: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(responses.len(), 2);

        let mut ids: Vec<i64> = responses.iter().map(|r| r["id"].as_i64().unwrap()).collect();
        ids.sort();
        assert_eq!(ids, vec![1, 2]);

        let echo = responses.iter().find(|r| r["id"] == json!(2)).unwrap();
        assert_eq!(echo["result"]["content"][0]["text"], json!("{\"x\":1}"));
    }

    #[tokio::test]
    async fn test_stdio_stops_on_cancel() {
        let (client, server) = tokio::io::duplex(1024);
        let (server_read, server_write) = tokio::io::split(server);
        let cancel = CancellationToken::new();

        let task = tokio::spawn(serve(server_read, server_write, handler(), cancel.clone()));
        cancel.cancel();

        task.await.unwrap().unwrap();
        drop(client);
    }

    #[tokio::test]
    async fn test_write_sse_flushes_every_block() {
        let handler = handler();
        let stream = handler
            .stream_tool("ticks", json!({}), "req-1", &CancellationToken::new())
            .unwrap();

        let mut output = Vec::new();
        let written = write_sse(&mut output, stream_events_to_sse(stream, "req-1"))
            .await
            .unwrap();

        let text = String::from_utf8(output).unwrap();
        assert_eq!(written, 4);
        assert_eq!(text.matches("event: progress\n").count(), 2);
        assert!(text.ends_with("\n\n"));
        assert!(text.contains("\"percentage\":50.0"));
    }
}
