//! Stream command: SSE output of a streaming tool

use tokio_util::sync::CancellationToken;
use toolgate_core::protocol::stream_events_to_sse;
use toolgate_core::transport::write_sse;
use toolgate_core::{ExecutorState, ProtocolHandler};
use tracing::info;
use uuid::Uuid;

use super::parse_args;

/// Run `tool` and print each event as an SSE block as it arrives
pub async fn run(
    handler: &ProtocolHandler,
    tool: &str,
    raw_args: &str,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let args = parse_args(raw_args)?;
    let request_id = Uuid::new_v4().to_string();

    let mut stream = handler.stream_tool(tool, args, request_id.clone(), cancel)?;
    let blocks = stream_events_to_sse(&mut stream, request_id);

    let mut stdout = tokio::io::stdout();
    let written = write_sse(&mut stdout, blocks).await?;

    let state = stream.state();
    info!(tool, events = written, %state, "stream finished");
    if state != ExecutorState::Done {
        anyhow::bail!("tool '{}' finished in state {}", tool, state);
    }
    Ok(())
}
