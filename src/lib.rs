//! logmunch — normalise heterogeneous log lines and stream them through
//! filters.
//!
//! This crate glues the layers together so that the binary and the
//! integration tests drive exactly the same code path.
//!
//! # Architecture
//!
//! ```text
//! Source ──► Parser ──► FilterChain ──► Drain
//!   │                                     │
//!   └── SourceLoader            stdout ◄──┘
//! ```
//!
//! Every arrow is a bounded `tokio` channel; every stage but the drain runs on
//! its own task.

use anyhow::Context;
use chrono::TimeDelta;
use logmunch_core::filter::{
    BucketizeKey, CompoundKey, FilterChain, FilterError, NormalizeUrlPath, Pick, RemoveHerokuDrainId,
    RoundTimestamp,
};
use logmunch_core::pipeline::DEFAULT_QUEUE_CAPACITY;
use logmunch_core::{Parser, Pipeline, Query, Script};
use logmunch_drains::Drain;
use logmunch_sources::SourceLoader;
use tokio::io::AsyncWrite;

/// Everything one run needs, already parsed and validated.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Locator of the source, e.g. `file:-` or `logentries:Production/api`.
    pub source: String,
    pub query: Query,
    pub drain: Drain,
    pub queue_capacity: usize,

    pub strip_drain_id: bool,
    /// `(key, templates)` pairs for [`NormalizeUrlPath`].
    pub normalize_paths: Vec<(String, Vec<String>)>,
    /// `(new_key, source_keys)` pairs for [`CompoundKey`].
    pub compounds: Vec<(String, Vec<String>)>,
    pub script: Option<String>,
    pub pick: Vec<String>,
    pub round_time: Option<TimeDelta>,
    pub bucketize: Vec<String>,
}

impl RunOptions {
    pub fn new(source: impl Into<String>, query: Query) -> Self {
        Self {
            source: source.into(),
            query,
            drain: Drain::Standard,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            strip_drain_id: false,
            normalize_paths: Vec::new(),
            compounds: Vec::new(),
            script: None,
            pick: Vec::new(),
            round_time: None,
            bucketize: Vec::new(),
        }
    }

    /// Build the filter chain in its fixed order: strip-drain-id,
    /// normalize-path, compound, group, script, pick, round-time, bucketize.
    pub fn filter_chain(&self) -> Result<FilterChain, FilterError> {
        let mut chain = FilterChain::new();

        if self.strip_drain_id {
            chain.push(RemoveHerokuDrainId);
        }
        for (key, templates) in &self.normalize_paths {
            chain.push(NormalizeUrlPath::new(key.clone(), templates.iter().cloned())?);
        }
        for (new_key, source_keys) in &self.compounds {
            chain.push(CompoundKey::new(new_key.clone(), source_keys.iter().cloned()));
        }
        for group in &self.query.group_by {
            chain.push(group.clone());
        }
        if let Some(source) = &self.script {
            chain.push(Script::new(source.clone())?);
        }
        if !self.pick.is_empty() {
            chain.push(Pick::new(self.pick.iter().cloned()));
        }
        if let Some(step) = self.round_time.filter(|step| *step > TimeDelta::zero()) {
            chain.push(RoundTimestamp::new(step));
        }
        for key in &self.bucketize {
            chain.push(BucketizeKey::new(key.clone()));
        }

        Ok(chain)
    }
}

/// Run the whole pipeline, writing the drain's output to `out`.
///
/// Setup problems (bad filters, unknown source) fail before anything is
/// read. A source failure mid-stream is returned after the drain has written
/// everything that was already buffered. Returns the number of records the
/// drain consumed.
pub async fn run<W>(loader: &SourceLoader, options: RunOptions, out: W) -> anyhow::Result<usize>
where
    W: AsyncWrite + Unpin,
{
    let chain = options.filter_chain().context("invalid filter configuration")?;
    let (source, locator) = loader.resolve(&options.source)?;

    let pipeline = Pipeline::new(Parser::new(), chain).with_capacity(options.queue_capacity);
    let (lines_tx, lines_rx) = pipeline.line_channel();
    let running = pipeline.spawn(lines_rx);

    let query = options.query;
    let fetch = tokio::spawn(async move { source.fetch(&locator, query, lines_tx).await });

    let consumed = options
        .drain
        .run(running.records, out)
        .await
        .context("writing output")?;

    running.parser.await?;
    running.filters.await?;
    let remaining = fetch.await??;
    tracing::debug!(
        consumed,
        filter = %remaining.filter,
        limit = ?remaining.limit,
        "run finished"
    );

    Ok(consumed)
}
