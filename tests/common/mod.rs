//! Shared test utilities for logmunch integration harnesses.
//!
//! Import everything you need via `mod common; use common::*;` at the top of
//! each harness file.

#![allow(dead_code)]

pub mod assertions;
pub mod builders;
pub mod fake_logentries_api;
pub mod fixtures;

pub use builders::*;
pub use fixtures::*;

use logmunch_core::Record;
use tokio::sync::mpsc;

/// Drain a receiver into a `Vec`.
pub async fn collect<T>(mut rx: mpsc::Receiver<T>) -> Vec<T> {
    let mut out = Vec::new();
    while let Some(item) = rx.recv().await {
        out.push(item);
    }
    out
}

/// A closed receiver pre-loaded with `records`.
pub async fn records_channel(records: Vec<Record>) -> mpsc::Receiver<Record> {
    let (tx, rx) = mpsc::channel(records.len().max(1));
    for record in records {
        tx.send(record).await.expect("receiver is alive");
    }
    rx
}
