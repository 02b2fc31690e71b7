//! logmunch-drains — where the record stream ends up.
//!
//! Every drain reads [`Record`]s until the channel closes, writes to an async
//! writer, and flushes it before returning the number of records consumed.

pub mod pivot;
pub mod sql;
pub mod text;

use logmunch_core::Record;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Drain {
    /// Canonical text, one line per record.
    Standard,
    /// One JSON object per line.
    Json,
    /// Time × value-of-key frequency table.
    CountOverTime { key: String },
    /// Same table as a gnuplot script.
    Gnuplot { key: String },
    /// `CREATE TABLE` + `INSERT` script.
    Sqlite,
}

impl Drain {
    pub async fn run<W>(&self, input: mpsc::Receiver<Record>, out: W) -> std::io::Result<usize>
    where
        W: AsyncWrite + Unpin,
    {
        let mut out = BufWriter::new(out);
        let consumed = match self {
            Drain::Standard => text::standard(input, &mut out).await?,
            Drain::Json => text::json(input, &mut out).await?,
            Drain::CountOverTime { key } => pivot::count(key, input, &mut out).await?,
            Drain::Gnuplot { key } => pivot::gnuplot(key, input, &mut out).await?,
            Drain::Sqlite => sql::sqlite(input, &mut out).await?,
        };
        out.flush().await?;

        tracing::debug!(drain = ?self, records = consumed, "drain finished");
        Ok(consumed)
    }
}
