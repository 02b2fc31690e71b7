//! Filters — composable `Record → Record | dropped` transforms.
//!
//! Each filter is a small struct carrying whatever it precomputed at
//! construction (compiled templates, a key set, a compiled script). A
//! [`FilterChain`] applies them in order and stops at the first drop.

use crate::record::Record;
use chrono::TimeDelta;
use regex::Regex;
use std::collections::HashSet;
use tokio::sync::mpsc;

/// Placeholder used by [`CompoundKey`] for a missing source key.
pub const MISSING_COMPONENT: &str = "∅";

/// Errors raised while building a filter, before any record flows.
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("invalid url template `{template}`: {reason}")]
    InvalidTemplate { template: String, reason: String },

    #[error("cannot compile script `{script}`: {reason}")]
    Script { script: String, reason: String },
}

/// A record transform. Returning `None` drops the record.
pub trait Filter: Send + Sync {
    fn apply(&self, record: Record) -> Option<Record>;
}

impl<F> Filter for F
where
    F: Fn(Record) -> Option<Record> + Send + Sync,
{
    fn apply(&self, record: Record) -> Option<Record> {
        self(record)
    }
}

// ---------------------------------------------------------------------------
// Chain runner
// ---------------------------------------------------------------------------

/// An ordered list of filters.
#[derive(Default)]
pub struct FilterChain {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a filter; it runs after every filter already in the chain.
    pub fn push(&mut self, filter: impl Filter + 'static) {
        self.filters.push(Box::new(filter));
    }

    pub fn with(mut self, filter: impl Filter + 'static) -> Self {
        self.push(filter);
        self
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Run `record` through every filter. Later filters never see a dropped
    /// record.
    pub fn apply(&self, record: Record) -> Option<Record> {
        self.filters
            .iter()
            .try_fold(record, |record, filter| filter.apply(record))
    }

    /// Filter stage: read records until `input` closes, forward survivors.
    pub async fn run(&self, mut input: mpsc::Receiver<Record>, output: mpsc::Sender<Record>) {
        let mut kept = 0usize;
        let mut dropped = 0usize;

        while let Some(record) = input.recv().await {
            match self.apply(record) {
                Some(record) => {
                    kept += 1;
                    if output.send(record).await.is_err() {
                        tracing::debug!("filter output closed early");
                        break;
                    }
                }
                None => dropped += 1,
            }
        }

        tracing::debug!(kept, dropped, "filter stage finished");
    }
}

impl std::fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterChain")
            .field("filters", &self.filters.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Built-in filters
// ---------------------------------------------------------------------------

/// Passes every record through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOp;

impl Filter for NoOp {
    fn apply(&self, record: Record) -> Option<Record> {
        Some(record)
    }
}

/// Keeps only the listed entry keys.
#[derive(Debug, Clone)]
pub struct Pick {
    keys: HashSet<String>,
}

impl Pick {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }
}

impl Filter for Pick {
    fn apply(&self, mut record: Record) -> Option<Record> {
        record.entries.retain(|key, _| self.keys.contains(key));
        Some(record)
    }
}

/// Rounds the timestamp to the nearest multiple of a duration.
///
/// Multiples are counted from the Unix epoch; exact halves go to the even
/// multiple. A non-positive duration leaves the time alone.
#[derive(Debug, Clone, Copy)]
pub struct RoundTimestamp {
    step: TimeDelta,
}

impl RoundTimestamp {
    pub fn new(step: TimeDelta) -> Self {
        Self { step }
    }
}

impl Filter for RoundTimestamp {
    fn apply(&self, mut record: Record) -> Option<Record> {
        let Some(step) = self.step.num_nanoseconds().filter(|n| *n > 0) else {
            return Some(record);
        };
        let Some(nanos) = record.time.timestamp_nanos_opt() else {
            return Some(record);
        };

        let mut quotient = nanos.div_euclid(step);
        let remainder = nanos.rem_euclid(step);
        let twice = remainder as i128 * 2;
        if twice > step as i128 || (twice == step as i128 && quotient % 2 != 0) {
            quotient += 1;
        }

        if let Some(rounded) = quotient.checked_mul(step) {
            record.time = chrono::DateTime::from_timestamp_nanos(rounded);
        }
        Some(record)
    }
}

/// Truncates a numeric entry to its order of magnitude: `411.6 → 400`.
///
/// Truncation is toward zero, so `-45 → -40`.
#[derive(Debug, Clone)]
pub struct BucketizeKey {
    key: String,
}

impl BucketizeKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl Filter for BucketizeKey {
    fn apply(&self, mut record: Record) -> Option<Record> {
        if !record.has_key(&self.key) {
            return Some(record);
        }

        let value = record.get_number(&self.key);
        if value == 0.0 {
            // Non-numeric values also land here and become a plain `0`.
            record.set_number(self.key.clone(), 0.0);
            return Some(record);
        }

        let bucket = 10f64.powf(value.abs().log10().floor());
        record.set_number(self.key.clone(), (value / bucket).trunc() * bucket);
        Some(record)
    }
}

/// Joins several entries into a new one: `a-b-∅`.
#[derive(Debug, Clone)]
pub struct CompoundKey {
    new_key: String,
    source_keys: Vec<String>,
}

impl CompoundKey {
    pub fn new<I, S>(new_key: impl Into<String>, source_keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            new_key: new_key.into(),
            source_keys: source_keys.into_iter().map(Into::into).collect(),
        }
    }
}

impl Filter for CompoundKey {
    fn apply(&self, mut record: Record) -> Option<Record> {
        let value = self
            .source_keys
            .iter()
            .map(|key| record.get(key).unwrap_or(MISSING_COMPONENT))
            .collect::<Vec<_>>()
            .join("-");
        record.insert(self.new_key.clone(), value);
        Some(record)
    }
}

/// Rewrites URL paths to the express-style template they match.
///
/// `path=/users/42` against `/users/:uid` becomes `path=/users/:uid uid=42`.
#[derive(Debug, Clone)]
pub struct NormalizeUrlPath {
    key: String,
    templates: Vec<(String, Regex)>,
}

impl NormalizeUrlPath {
    pub fn new<I, S>(key: impl Into<String>, templates: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let templates = templates
            .into_iter()
            .map(|template| {
                let template = template.into();
                let regex = compile_template(&template)?;
                Ok((template, regex))
            })
            .collect::<Result<_, FilterError>>()?;

        Ok(Self {
            key: key.into(),
            templates,
        })
    }
}

fn compile_template(template: &str) -> Result<Regex, FilterError> {
    let invalid = |reason: String| FilterError::InvalidTemplate {
        template: template.to_string(),
        reason,
    };

    let mut pattern = String::from("^");
    for (i, segment) in template.split('/').enumerate() {
        if i > 0 {
            pattern.push('/');
        }
        match segment.strip_prefix(':') {
            Some(name) => {
                let valid = name
                    .chars()
                    .next()
                    .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                    && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
                if !valid {
                    return Err(invalid(format!("bad parameter name `{name}`")));
                }
                pattern.push_str(&format!("(?P<{name}>[^/]+)"));
            }
            None => pattern.push_str(&regex::escape(segment)),
        }
    }
    pattern.push('$');

    Regex::new(&pattern).map_err(|e| invalid(e.to_string()))
}

impl Filter for NormalizeUrlPath {
    fn apply(&self, mut record: Record) -> Option<Record> {
        let Some(value) = record.get(&self.key) else {
            return Some(record);
        };
        let path = value.split('?').next().unwrap_or_default();

        let matched = self.templates.iter().find_map(|(template, regex)| {
            let captures = regex.captures(path)?;
            let params: Vec<(String, String)> = regex
                .capture_names()
                .flatten()
                .filter_map(|name| Some((name.to_string(), captures.name(name)?.as_str().to_string())))
                .collect();
            Some((template.clone(), params))
        });

        let Some((template, params)) = matched else {
            return Some(record);
        };

        for (name, value) in params {
            record.insert(name, value);
        }
        record.insert(self.key.clone(), template);
        Some(record)
    }
}

/// Moves Heroku's `d.<uuid>` drain identifier out of the name.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveHerokuDrainId;

/// Fixed characters of `d.XXXXXXXX-XXXX-XXXX-XXXX-XXXXXXXXXXXX `.
const DRAIN_ID_SHAPE: [(usize, u8); 7] = [
    (0, b'd'),
    (1, b'.'),
    (10, b'-'),
    (15, b'-'),
    (20, b'-'),
    (25, b'-'),
    (38, b' '),
];

const DRAIN_ID_LEN: usize = 38;

impl Filter for RemoveHerokuDrainId {
    fn apply(&self, mut record: Record) -> Option<Record> {
        let bytes = record.name.as_bytes();
        let matches = DRAIN_ID_SHAPE
            .iter()
            .all(|(at, expected)| bytes.get(*at) == Some(expected));
        if !matches {
            return Some(record);
        }

        let drain_id = record.name[..DRAIN_ID_LEN].to_string();
        record.name = record.name[DRAIN_ID_LEN + 1..].to_string();
        record.insert("drainId", drain_id);
        Some(record)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
