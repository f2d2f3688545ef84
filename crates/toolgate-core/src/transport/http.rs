//! HTTP transport
//!
//! - `POST /rpc`: one JSON-RPC message per request body
//! - `POST /stream?tool=<name>`: runs a streaming tool, the body is its
//!   argument object, events come back as Server-Sent Events
//! - `GET /health`: liveness check
//!
//! Request bodies are capped at [`HttpConfig::max_request_size`]; CORS
//! headers are added for the configured origins.

use axum::body::{Body, Bytes};
use axum::extract::{DefaultBodyLimit, Query, Request, State};
use axum::http::{HeaderName, HeaderValue, Method, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::net::TcpListener;
use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{ToolgateError, ToolgateResult};
use crate::events::Event;
use crate::protocol::{ProtocolHandler, format_event, stream_events_to_sse};

const DEFAULT_ADDRESS: &str = "127.0.0.1:8080";
/// 10 MiB
const DEFAULT_MAX_REQUEST_SIZE: usize = 10 * 1024 * 1024;

const X_ACCEL_BUFFERING: HeaderName = HeaderName::from_static("x-accel-buffering");

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// `host:port` to listen on
    pub address: String,
    /// Largest accepted request body, in bytes
    pub max_request_size: usize,
    /// Origins granted CORS access; `*` grants any origin. Empty sends no
    /// CORS headers.
    pub allowed_origins: Vec<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            max_request_size: DEFAULT_MAX_REQUEST_SIZE,
            allowed_origins: Vec::new(),
        }
    }
}

impl HttpConfig {
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn with_max_request_size(mut self, bytes: usize) -> Self {
        self.max_request_size = bytes;
        self
    }

    pub fn with_allowed_origins<I, S>(mut self, origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_origins = origins.into_iter().map(Into::into).collect();
        self
    }

    pub fn validate(&self) -> ToolgateResult<()> {
        if self.address.trim().is_empty() {
            return Err(ToolgateError::config("http address must not be empty"));
        }
        if self.max_request_size == 0 {
            return Err(ToolgateError::config(
                "http max_request_size must be greater than 0",
            ));
        }
        Ok(())
    }
}

#[derive(Clone)]
struct HttpState {
    handler: Arc<ProtocolHandler>,
    shutdown: CancellationToken,
}

/// Build the routes. In-flight calls are cancelled when `shutdown` fires
/// or when their client goes away.
pub fn router(
    handler: Arc<ProtocolHandler>,
    config: &HttpConfig,
    shutdown: CancellationToken,
) -> Router {
    let origins: Arc<[String]> = config.allowed_origins.clone().into();

    Router::new()
        .route("/rpc", post(rpc))
        .route("/stream", post(stream))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(config.max_request_size))
        .layer(middleware::from_fn_with_state(origins, cors))
        .layer(middleware::from_fn(log_request))
        .with_state(HttpState { handler, shutdown })
}

/// Bind `config.address` and serve until `shutdown` fires
pub async fn serve(
    handler: Arc<ProtocolHandler>,
    config: &HttpConfig,
    shutdown: CancellationToken,
) -> ToolgateResult<()> {
    let listener = TcpListener::bind(&config.address).await.map_err(|e| {
        ToolgateError::Io(format!("failed to bind {}: {}", config.address, e))
    })?;
    serve_on(listener, handler, config, shutdown).await
}

/// Serve on an already bound listener until `shutdown` fires, then drain
/// open connections
pub async fn serve_on(
    listener: TcpListener,
    handler: Arc<ProtocolHandler>,
    config: &HttpConfig,
    shutdown: CancellationToken,
) -> ToolgateResult<()> {
    let app = router(handler, config, shutdown.clone());
    let addr = listener.local_addr()?;
    info!(%addr, "http transport listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("http transport stopped");
    Ok(())
}

async fn rpc(State(state): State<HttpState>, body: Bytes) -> Response {
    let scope = state.shutdown.child_token();
    let _guard = scope.clone().drop_guard();

    match state.handler.handle_bytes(&body, &scope).await {
        Some(bytes) => ([(header::CONTENT_TYPE, "application/json")], bytes).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct StreamQuery {
    tool: Option<String>,
}

async fn stream(
    State(state): State<HttpState>,
    Query(query): Query<StreamQuery>,
    body: Bytes,
) -> Response {
    let args = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Object(Map::new())
    } else {
        match serde_json::from_slice::<Value>(&body) {
            Ok(args @ Value::Object(_)) => args,
            Ok(_) => return sse_error("invalid_request", "arguments must be a JSON object"),
            Err(e) => {
                return sse_error("invalid_request", format!("failed to parse arguments: {}", e));
            }
        }
    };

    let Some(tool) = query.tool.filter(|tool| !tool.is_empty()) else {
        return sse_error("missing_tool", "tool name required in query parameter 'tool'");
    };
    match state.handler.registry().get(&tool) {
        None => return sse_error("tool_not_found", format!("tool not found: {}", tool)),
        Some(definition) if !definition.streaming => {
            return sse_error(
                "not_streaming",
                format!("tool '{}' does not support streaming", tool),
            );
        }
        Some(_) => {}
    }

    let request_id = Uuid::new_v4().to_string();
    let scope = state.shutdown.child_token();
    let events = match state
        .handler
        .stream_tool(&tool, args, request_id.clone(), &scope)
    {
        Ok(events) => events,
        Err(e) => return sse_error("internal_error", e.message),
    };
    debug!(tool = %tool, request_id = %request_id, "sse stream opened");

    let blocks = CancelOnDrop {
        inner: stream_events_to_sse(events, request_id),
        _guard: scope.drop_guard(),
    };
    sse_response(Body::from_stream(blocks.map(Ok::<_, Infallible>)))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// A single error event; the error code travels in the `id` field
fn sse_error(code: &str, message: impl Into<String>) -> Response {
    debug!(code, "sse request rejected");
    sse_response(Body::from(format_event(&Event::error(message, false), code)))
}

fn sse_response(body: Body) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            (X_ACCEL_BUFFERING, "no"),
        ],
        body,
    )
        .into_response()
}

/// Cancels the invocation once the response body is dropped, which
/// happens when the client disconnects mid-stream
struct CancelOnDrop<S> {
    inner: S,
    _guard: DropGuard,
}

impl<S: Stream + Unpin> Stream for CancelOnDrop<S> {
    type Item = S::Item;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

async fn cors(State(origins): State<Arc<[String]>>, request: Request, next: Next) -> Response {
    let allowed = request
        .headers()
        .get(header::ORIGIN)
        .filter(|origin| {
            origin.to_str().is_ok_and(|origin| {
                origins.iter().any(|allowed| allowed == "*" || allowed == origin)
            })
        })
        .cloned();

    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::OK.into_response()
    } else {
        next.run(request).await
    };

    if let Some(origin) = allowed {
        let headers = response.headers_mut();
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("POST, OPTIONS"),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        );
    }
    response
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let started = Instant::now();

    let response = next.run(request).await;

    info!(
        %method,
        path = %path,
        status = response.status().as_u16(),
        duration_ms = started.elapsed().as_millis() as u64,
        "http request completed"
    );
    response
}
