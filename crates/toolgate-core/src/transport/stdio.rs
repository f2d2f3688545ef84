//! Newline-delimited JSON-RPC over a byte stream

use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::LinesStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::ToolgateResult;
use crate::protocol::ProtocolHandler;

/// Serve requests read line by line from `reader`, writing one response line
/// per request to `writer`.
///
/// Requests are handled concurrently, so responses may arrive out of order;
/// callers match them by id. Returns once the input is exhausted and every
/// in-flight request has answered, or as soon as `cancel` fires.
pub async fn serve<R, W>(
    reader: R,
    mut writer: W,
    handler: Arc<ProtocolHandler>,
    cancel: CancellationToken,
) -> ToolgateResult<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let (tx, mut rx) = mpsc::channel::<Vec<u8>>(64);
    let mut lines = LinesStream::new(BufReader::new(reader).lines());
    let mut handled = 0u64;

    info!("stdio transport ready");
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!(handled, "stdio transport cancelled");
                return Ok(());
            }
            Some(response) = rx.recv() => write_line(&mut writer, &response).await?,
            line = lines.next() => {
                let Some(line) = line.transpose()? else { break };
                let line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }

                handled += 1;
                let handler = handler.clone();
                let tx = tx.clone();
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    if let Some(response) = handler.handle_bytes(line.as_bytes(), &cancel).await {
                        if tx.send(response).await.is_err() {
                            debug!("transport closed before response was written");
                        }
                    }
                });
            }
        }
    }

    // Input exhausted: flush responses still in flight
    drop(tx);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            response = rx.recv() => match response {
                Some(response) => write_line(&mut writer, &response).await?,
                None => break,
            },
        }
    }

    info!(handled, "stdio transport finished");
    Ok(())
}

async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, bytes: &[u8]) -> ToolgateResult<()> {
    writer.write_all(bytes).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}
