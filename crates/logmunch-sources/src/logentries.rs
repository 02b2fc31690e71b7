//! LogEntries pull API source.
//!
//! `GET {base}/{password}/hosts/{path}/?start=<ms>&end=<ms>[&filter=..][&limit=..]`
//!
//! The filter and limit are applied server-side, so they are cleared from the
//! returned [`Query`].

use crate::error::SourceError;
use crate::forward_lines;
use crate::locator::Locator;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use logmunch_core::Query;
use tokio::sync::mpsc;
use tokio_util::io::StreamReader;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://pull.logentries.com";

#[derive(Debug, Clone)]
pub struct LogEntriesSource {
    client: reqwest::Client,
    base_url: String,
}

impl Default for LogEntriesSource {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl LogEntriesSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the pull URL for `locator` and `query`.
    ///
    /// Returns the URL and the query with its server-side parts cleared.
    pub fn request_url(&self, locator: &Locator, mut query: Query) -> Result<(Url, Query), SourceError> {
        let password = locator
            .password
            .as_deref()
            .ok_or(SourceError::MissingCredentials)?;

        let raw = format!(
            "{}/{}/hosts/{}/",
            self.base_url.trim_end_matches('/'),
            password,
            locator.path.trim_start_matches('/'),
        );
        let mut url = Url::parse(&raw)?;

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("start", &query.start.timestamp_millis().to_string());
            pairs.append_pair("end", &query.end.timestamp_millis().to_string());

            if !query.filter.is_empty() {
                pairs.append_pair("filter", &query.filter);
                query.filter.clear();
            }
            if let Some(limit) = query.limit.take() {
                pairs.append_pair("limit", &limit.to_string());
            }
        }

        Ok((url, query))
    }

    pub async fn fetch(
        &self,
        locator: &Locator,
        query: Query,
        out: mpsc::Sender<String>,
    ) -> Result<Query, SourceError> {
        let (url, query) = self.request_url(locator, query)?;
        tracing::debug!(path = %locator.path, "requesting LogEntries logs");

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(SourceError::Status {
                status: status.as_u16(),
                url: redact(&url, locator),
            });
        }

        let sent = forward_lines(body_reader(response), &out, None).await?;
        tracing::debug!(lines = sent, "LogEntries source finished");
        Ok(query)
    }
}

fn body_reader(
    response: reqwest::Response,
) -> StreamReader<impl Stream<Item = std::io::Result<Bytes>>, Bytes> {
    StreamReader::new(response.bytes_stream().map(|chunk| chunk.map_err(std::io::Error::other)))
}

/// The request URL with the account key masked, for error messages.
fn redact(url: &Url, locator: &Locator) -> String {
    match locator.password.as_deref() {
        Some(password) if !password.is_empty() => url.as_str().replace(password, "***"),
        _ => url.to_string(),
    }
}
