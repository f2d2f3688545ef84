//! Serve command: JSON-RPC over stdio or HTTP

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use toolgate_core::transport;
use toolgate_core::{HttpConfig, ProtocolHandler};

/// Serve until stdin closes or `cancel` fires
pub async fn run(handler: Arc<ProtocolHandler>, cancel: CancellationToken) -> anyhow::Result<()> {
    transport::serve(tokio::io::stdin(), tokio::io::stdout(), handler, cancel).await?;
    Ok(())
}

/// Serve HTTP on `config.address` until `cancel` fires
pub async fn run_http(
    handler: Arc<ProtocolHandler>,
    config: &HttpConfig,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    transport::http::serve(handler, config, cancel).await?;
    Ok(())
}
