//! File and stdin source.

use crate::error::SourceError;
use crate::locator::Locator;
use crate::forward_lines;
use logmunch_core::Query;
use tokio::io::BufReader;
use tokio::sync::mpsc;

/// Reads a file, or stdin for `file:-`, one raw line per message.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSource;

impl FileSource {
    /// Stream the file's non-empty lines to `out`, stopping after
    /// `query.limit` lines when set. `out` is dropped on return.
    pub async fn fetch(
        &self,
        locator: &Locator,
        mut query: Query,
        out: mpsc::Sender<String>,
    ) -> Result<Query, SourceError> {
        let limit = query.limit.take();

        let sent = if locator.is_stdin() {
            tracing::debug!("reading from stdin");
            forward_lines(BufReader::new(tokio::io::stdin()), &out, limit).await?
        } else {
            tracing::debug!(path = %locator.path, "reading file");
            let file = tokio::fs::File::open(&locator.path).await?;
            forward_lines(BufReader::new(file), &out, limit).await?
        };

        tracing::debug!(lines = sent, "file source finished");
        Ok(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::io::Write;

    async fn run(locator: &str, query: Query) -> (Result<Query, SourceError>, Vec<String>) {
        let locator: Locator = locator.parse().unwrap();
        let (tx, mut rx) = mpsc::channel(4);
        let fetch = tokio::spawn(async move { FileSource.fetch(&locator, query, tx).await });

        let mut lines = Vec::new();
        while let Some(line) = rx.recv().await {
            lines.push(line);
        }
        (fetch.await.unwrap(), lines)
    }

    #[tokio::test]
    async fn streams_non_empty_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "one\n\ntwo\r\nthree").unwrap();

        let locator = format!("file:{}", file.path().display());
        let (result, lines) = run(&locator, Query::new(Utc::now(), Utc::now())).await;

        assert!(result.is_ok());
        assert_eq!(lines, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn honours_and_clears_limit() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "a\nb\nc").unwrap();

        let locator = format!("file:{}", file.path().display());
        let (result, lines) = run(&locator, Query::new(Utc::now(), Utc::now()).with_limit(2)).await;

        assert_eq!(lines, vec!["a", "b"]);
        assert_eq!(result.unwrap().limit, None);
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let (result, lines) = run("file:/definitely/not/here.log", Query::new(Utc::now(), Utc::now())).await;
        assert!(matches!(result, Err(SourceError::Io(_))));
        assert!(lines.is_empty());
    }
}
