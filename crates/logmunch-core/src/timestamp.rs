//! Timestamp encodings the parser recognises.
//!
//! The list is built once and handed to the [`Parser`](crate::parser::Parser);
//! it is never mutated while lines are being parsed.

use chrono::{DateTime, Utc};

/// One accepted timestamp encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampFormat {
    /// A `chrono` strftime pattern that includes an offset.
    Pattern(&'static str),
    /// RFC3339, any sub-second precision, `Z` or numeric offset.
    Rfc3339,
}

/// Node.js' Winston logger: microseconds and a `+hh:mm` offset.
pub const WINSTON: TimestampFormat = TimestampFormat::Pattern("%Y-%m-%dT%H:%M:%S%.6f%:z");

/// ISO-8601 with a compact `+hhmm` offset.
pub const COMPACT_OFFSET: TimestampFormat = TimestampFormat::Pattern("%Y-%m-%dT%H:%M:%S%.f%z");

/// Default lookup order. The first format that accepts a token wins.
pub const DEFAULT_FORMATS: &[TimestampFormat] = &[WINSTON, TimestampFormat::Rfc3339, COMPACT_OFFSET];

impl TimestampFormat {
    pub fn parse(&self, token: &str) -> Option<DateTime<Utc>> {
        let parsed = match self {
            TimestampFormat::Pattern(pattern) => DateTime::parse_from_str(token, pattern),
            TimestampFormat::Rfc3339 => DateTime::parse_from_rfc3339(token),
        };
        parsed.ok().map(|t| t.with_timezone(&Utc))
    }
}

/// Strip the `timestamp='…'` wrapping some front-end loggers emit.
pub fn unwrap_quoted(token: &str) -> &str {
    match token.strip_prefix("timestamp='") {
        Some(inner) => inner.strip_suffix('\'').unwrap_or(inner),
        None => token,
    }
}
