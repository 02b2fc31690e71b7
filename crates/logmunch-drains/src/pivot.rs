//! Time × value-of-key frequency tables: plain text and gnuplot.
//!
//! Both drains need the whole stream before writing anything, since rows are
//! sorted by time and columns by value.

use chrono::{DateTime, Utc};
use logmunch_core::record::format_time;
use logmunch_core::Record;
use std::collections::{BTreeMap, BTreeSet};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

const GNUPLOT_PREAMBLE: &str = "set terminal png\nset output 'x.png'\n\nset timefmt \"%s\"\nset xdata time\n\nplot";

/// Counts per timestamp per distinct value of one key.
#[derive(Debug, Default)]
pub struct Tally {
    values: BTreeSet<String>,
    counts: BTreeMap<DateTime<Utc>, BTreeMap<String, usize>>,
}

impl Tally {
    /// Records without the key count under the empty value.
    pub async fn collect(key: &str, mut input: mpsc::Receiver<Record>) -> Self {
        let mut tally = Self::default();
        while let Some(record) = input.recv().await {
            tally.add(record.time, record.get(key).unwrap_or_default());
        }
        tally
    }

    pub fn add(&mut self, time: DateTime<Utc>, value: &str) {
        if !self.values.contains(value) {
            self.values.insert(value.to_string());
        }
        *self
            .counts
            .entry(time)
            .or_default()
            .entry(value.to_string())
            .or_insert(0) += 1;
    }

    pub fn count(&self, time: &DateTime<Utc>, value: &str) -> usize {
        self.counts
            .get(time)
            .and_then(|row| row.get(value))
            .copied()
            .unwrap_or(0)
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(String::as_str)
    }

    pub fn times(&self) -> impl Iterator<Item = &DateTime<Utc>> {
        self.counts.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// ```text
    /// 2015-03-29T12:00:00Z
    ///     200:3
    ///     503:0
    /// ```
    pub fn to_table(&self) -> String {
        let mut out = String::new();
        for time in self.times() {
            out.push_str(&format_time(time));
            out.push('\n');
            for value in self.values() {
                out.push_str(&format!("\t{value}:{}\n", self.count(time, value)));
            }
        }
        out
    }

    /// A gnuplot script with one inline data block per value.
    pub fn to_gnuplot(&self) -> String {
        let mut out = String::from(GNUPLOT_PREAMBLE);
        let titles: Vec<String> = self
            .values()
            .map(|value| format!(" '-' using 1:2 with linespoints title '{value}'"))
            .collect();
        out.push_str(&titles.join(", \\\n"));
        out.push('\n');

        for value in self.values() {
            for time in self.times() {
                out.push_str(&format!(" {}\t{}\n", time.timestamp(), self.count(time, value)));
            }
            out.push_str("EOF\n");
        }
        out
    }
}

pub async fn count<W>(key: &str, input: mpsc::Receiver<Record>, out: &mut W) -> std::io::Result<usize>
where
    W: AsyncWrite + Unpin,
{
    let tally = Tally::collect(key, input).await;
    out.write_all(tally.to_table().as_bytes()).await?;
    Ok(tally.counts.values().flat_map(|row| row.values()).sum())
}

pub async fn gnuplot<W>(key: &str, input: mpsc::Receiver<Record>, out: &mut W) -> std::io::Result<usize>
where
    W: AsyncWrite + Unpin,
{
    let tally = Tally::collect(key, input).await;
    out.write_all(tally.to_gnuplot().as_bytes()).await?;
    Ok(tally.counts.values().flat_map(|row| row.values()).sum())
}
