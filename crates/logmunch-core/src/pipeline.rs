//! Stage wiring: raw lines ──► Parser ──► FilterChain ──► records.
//!
//! Each stage is a tokio task connected to the next by a bounded mpsc channel.
//! A stage drops its sender once its input is closed and drained, so
//! end-of-stream flows downstream without an explicit signal.

use crate::filter::FilterChain;
use crate::parser::Parser;
use crate::record::Record;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

#[derive(Debug)]
pub struct Pipeline {
    parser: Parser,
    filters: FilterChain,
    capacity: usize,
}

/// Handles of a running pipeline.
#[derive(Debug)]
pub struct Running {
    /// Records that made it through every filter, in input order.
    pub records: mpsc::Receiver<Record>,
    pub parser: JoinHandle<()>,
    pub filters: JoinHandle<()>,
}

impl Pipeline {
    pub fn new(parser: Parser, filters: FilterChain) -> Self {
        Self {
            parser,
            filters,
            capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }

    /// Bound for every inter-stage channel. Zero is bumped to one.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// A sender/receiver pair sized like the inner queues, for the source side.
    pub fn line_channel(&self) -> (mpsc::Sender<String>, mpsc::Receiver<String>) {
        mpsc::channel(self.capacity)
    }

    /// Spawn the parser and filter stages on the current runtime.
    pub fn spawn(self, lines: mpsc::Receiver<String>) -> Running {
        let (parsed_tx, parsed_rx) = mpsc::channel(self.capacity);
        let (filtered_tx, filtered_rx) = mpsc::channel(self.capacity);

        tracing::debug!(capacity = self.capacity, filters = self.filters.len(), "starting pipeline");

        let parser = self.parser;
        let parser = tokio::spawn(async move { parser.run(lines, parsed_tx).await });

        let filters = self.filters;
        let filters = tokio::spawn(async move { filters.run(parsed_rx, filtered_tx).await });

        Running {
            records: filtered_rx,
            parser,
            filters,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
