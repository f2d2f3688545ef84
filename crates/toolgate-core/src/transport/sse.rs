//! SSE block writer

use futures::{Stream, StreamExt};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::ToolgateResult;

/// Write each SSE block as soon as it is produced, flushing after every
/// block. Returns the number of blocks written.
pub async fn write_sse<W, S>(writer: &mut W, blocks: S) -> ToolgateResult<usize>
where
    W: AsyncWrite + Unpin,
    S: Stream<Item = String>,
{
    let mut blocks = std::pin::pin!(blocks);
    let mut written = 0;

    while let Some(block) = blocks.next().await {
        writer.write_all(block.as_bytes()).await?;
        writer.flush().await?;
        written += 1;
    }
    Ok(written)
}
