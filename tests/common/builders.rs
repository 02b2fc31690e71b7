//! Test builders: ergonomic constructors for `Record` and `Query`.
//!
//! These builders are designed for readability in test assertions, not for
//! production use. They panic on invalid input rather than returning `Result`.

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use logmunch_core::{Query, QueryGroup, Record};

/// `2015-03-29T12:29:30Z`, the instant most fixtures are pinned to.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2015, 3, 29, 12, 29, 30).unwrap()
}

// ---------------------------------------------------------------------------
// RecordBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for [`Record`] fixtures.
///
/// ```rust,ignore
/// let record = RecordBuilder::new("heroku router")
///     .offset_ms(5)
///     .entry("status", "200")
///     .build();
/// ```
pub struct RecordBuilder {
    time: DateTime<Utc>,
    name: String,
    entries: Vec<(String, String)>,
}

impl RecordBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            time: t0(),
            name: name.into(),
            entries: Vec::new(),
        }
    }

    pub fn time(mut self, time: DateTime<Utc>) -> Self {
        self.time = time;
        self
    }

    /// Shift the time relative to [`t0`].
    pub fn offset_ms(mut self, ms: i64) -> Self {
        self.time = t0() + TimeDelta::milliseconds(ms);
        self
    }

    pub fn entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.push((key.into(), value.into()));
        self
    }

    pub fn build(self) -> Record {
        self.entries
            .into_iter()
            .fold(Record::new(self.time, self.name), |record, (key, value)| {
                record.with_entry(key, value)
            })
    }
}

// ---------------------------------------------------------------------------
// QueryBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for [`Query`] with a fixed one-day window ending at [`t0`].
pub struct QueryBuilder {
    query: Query,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self {
            query: Query::new(t0() - TimeDelta::hours(24), t0()),
        }
    }

    pub fn filter(mut self, filter: &str) -> Self {
        self.query.filter = filter.to_string();
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.query.limit = Some(limit);
        self
    }

    pub fn group(mut self, name: &str, keys: &[&str]) -> Self {
        self.query.group_by.push(QueryGroup::new(name, keys.iter().copied()));
        self
    }

    pub fn build(self) -> Query {
        self.query
    }
}
