//! Query descriptor handed to a source, and the grouping helper.

use crate::filter::Filter;
use crate::record::Record;
use chrono::{DateTime, Utc};

/// Placeholder used by [`QueryGroup`] for a missing key.
pub const MISSING_GROUP_VALUE: &str = "-";

/// What to fetch. Sources clear the parts they already applied server-side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Prefix filter; empty means "everything".
    pub filter: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub limit: Option<usize>,
    pub group_by: Vec<QueryGroup>,
}

impl Query {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            filter: String::new(),
            start,
            end,
            limit: None,
            group_by: Vec::new(),
        }
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_group(mut self, group: QueryGroup) -> Self {
        self.group_by.push(group);
        self
    }
}

/// Derives a grouping entry from several keys: `b×d`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryGroup {
    pub name: String,
    pub keys: Vec<String>,
}

impl QueryGroup {
    pub fn new<I, S>(name: impl Into<String>, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn group(&self, record: &mut Record) {
        let value = self
            .keys
            .iter()
            .map(|key| record.get(key).unwrap_or(MISSING_GROUP_VALUE))
            .collect::<Vec<_>>()
            .join("×");
        record.insert(self.name.clone(), value);
    }
}

impl Filter for QueryGroup {
    fn apply(&self, mut record: Record) -> Option<Record> {
        self.group(&mut record);
        Some(record)
    }
}
