//! Call command: one-shot `tools/call`

use serde_json::json;
use tokio_util::sync::CancellationToken;
use toolgate_core::{JsonRpcRequest, ProtocolHandler};

use super::parse_args;

/// Call `tool` once and print the JSON-RPC response
pub async fn run(
    handler: &ProtocolHandler,
    tool: &str,
    raw_args: &str,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let args = parse_args(raw_args)?;
    let request = JsonRpcRequest::new(1i64, "tools/call")
        .with_params(json!({ "name": tool, "arguments": args }));

    if let Some(response) = handler.handle(request, cancel).await {
        let failed = !response.is_success();
        println!("{}", serde_json::to_string_pretty(&response)?);
        if failed {
            anyhow::bail!("tool '{}' failed", tool);
        }
    }
    Ok(())
}
