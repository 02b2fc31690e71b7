//! Line-per-record drains: canonical text and JSON.

use logmunch_core::Record;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

/// One `render()`ed line per record.
pub async fn standard<W>(mut input: mpsc::Receiver<Record>, out: &mut W) -> std::io::Result<usize>
where
    W: AsyncWrite + Unpin,
{
    let mut written = 0;
    while let Some(record) = input.recv().await {
        let mut line = record.render();
        line.push('\n');
        out.write_all(line.as_bytes()).await?;
        written += 1;
    }
    Ok(written)
}

/// One JSON object per line.
pub async fn json<W>(mut input: mpsc::Receiver<Record>, out: &mut W) -> std::io::Result<usize>
where
    W: AsyncWrite + Unpin,
{
    let mut written = 0;
    while let Some(record) = input.recv().await {
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');
        out.write_all(&line).await?;
        written += 1;
    }
    Ok(written)
}
