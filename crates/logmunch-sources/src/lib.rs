//! logmunch-sources — raw log line sources for logmunch.
//!
//! A source reads raw text from somewhere (a file, stdin, the LogEntries
//! pull API), pushes one line per message onto an mpsc channel, and closes it
//! when done or on error. The [`SourceLoader`] turns a locator string into the
//! right source.

pub mod error;
pub mod file;
pub mod loader;
pub mod locator;
pub mod logentries;

pub use error::SourceError;
pub use file::FileSource;
pub use loader::SourceLoader;
pub use locator::Locator;
pub use logentries::LogEntriesSource;

use logmunch_core::Query;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;

/// Every source logmunch knows how to read from.
#[derive(Debug, Clone)]
pub enum Source {
    File(FileSource),
    LogEntries(LogEntriesSource),
}

impl Source {
    /// Stream raw lines for `query` to `out`.
    ///
    /// Returns `query` with whatever the source already applied cleared.
    /// `out` is dropped on return, which closes the channel.
    pub async fn fetch(
        &self,
        locator: &Locator,
        query: Query,
        out: mpsc::Sender<String>,
    ) -> Result<Query, SourceError> {
        match self {
            Source::File(source) => source.fetch(locator, query, out).await,
            Source::LogEntries(source) => source.fetch(locator, query, out).await,
        }
    }
}

/// Forward the non-empty lines of `reader` to `out`, at most `limit` of them.
///
/// Stops quietly when the receiver hangs up. Returns the number of lines sent.
pub(crate) async fn forward_lines<R>(
    reader: R,
    out: &mpsc::Sender<String>,
    limit: Option<usize>,
) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut sent = 0usize;

    while limit.map_or(true, |limit| sent < limit) {
        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.is_empty() {
            continue;
        }
        if out.send(line).await.is_err() {
            tracing::debug!("source output closed early");
            break;
        }
        sent += 1;
    }

    Ok(sent)
}
