//! The normalised [`Record`] shared by every pipeline stage.
//!
//! A record is created by the parser for each timestamped input line, mutated
//! in place by the filter chain, and consumed by a drain. Values are always
//! kept as text; [`Record::get_number`] is the on-demand numeric view.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// One normalised log line.
///
/// Equality compares `time`, `name`, and `entries` as a set of pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Timestamp found in the line, converted to UTC.
    pub time: DateTime<Utc>,
    /// Short free-text label; may be empty or contain spaces.
    pub name: String,
    /// Attribute key/value pairs. Iterates in key order.
    pub entries: BTreeMap<String, String>,
}

impl Record {
    pub fn new(time: DateTime<Utc>, name: impl Into<String>) -> Self {
        Self {
            time,
            name: name.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Builder-style insert, handy when assembling fixtures.
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// `false` when the key is absent.
    pub fn key_equals(&self, key: &str, value: &str) -> bool {
        self.get(key) == Some(value)
    }

    /// Numeric view of an entry.
    ///
    /// Everything except ASCII digits, `.` and `-` is stripped before parsing,
    /// so `"12ms"` reads as `12`. Missing keys and unparseable leftovers read
    /// as `0`.
    pub fn get_number(&self, key: &str) -> f64 {
        let Some(value) = self.get(key) else {
            return 0.0;
        };

        let digits: String = value
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
            .collect();

        digits.parse().unwrap_or(0.0)
    }

    /// Store `value` using its shortest round-trip decimal text.
    pub fn set_number(&mut self, key: impl Into<String>, value: f64) {
        self.entries.insert(key.into(), format_number(value));
    }

    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.name.starts_with(prefix)
    }

    /// Canonical single-line text form. Same as the `Display` output.
    pub fn render(&self) -> String {
        self.to_string()
    }

    /// Milliseconds since the Unix epoch.
    pub fn unix_millis(&self) -> i64 {
        self.time.timestamp_millis()
    }
}

/// Shortest decimal text that parses back to `value`, never in exponent form.
pub fn format_number(value: f64) -> String {
    // f64's Display is already shortest-round-trip and exponent-free.
    format!("{value}")
}

/// RFC3339 with as many sub-second digits as needed, always `Z`.
pub fn format_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

// ---------------------------------------------------------------------------
// Canonical text rendering
// ---------------------------------------------------------------------------

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pairs: Vec<String> = self
            .entries
            .iter()
            .map(|(key, value)| format!("{}={}", render_key(key), render_value(value)))
            .collect();
        // Sorted on the rendered pair, not the key: `a.b=` sorts before `a=`.
        pairs.sort();

        write!(f, "{} {}", format_time(&self.time), self.name)?;
        for pair in pairs {
            write!(f, " {pair}")?;
        }
        Ok(())
    }
}

fn render_key(key: &str) -> String {
    if key.contains(' ') {
        quote(key)
    } else {
        key.to_string()
    }
}

/// Characters that would make the parser misread a bare value.
const NEEDS_QUOTES: &[char] = &[' ', '"', '\'', '=', '{', '\\'];

fn render_value(value: &str) -> String {
    if value.contains(NEEDS_QUOTES) {
        quote(value)
    } else {
        value.replace('\n', "\\n")
    }
}

fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

// ---------------------------------------------------------------------------
// JSON wire shape
// ---------------------------------------------------------------------------

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Record", 4)?;
        state.serialize_field("time", &format_time(&self.time))?;
        state.serialize_field("unixtime", &self.unix_millis())?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("entries", &self.entries)?;
        state.end()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
