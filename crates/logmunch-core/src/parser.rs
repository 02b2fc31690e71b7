//! Parser — turns one raw line of text into a [`Record`].
//!
//! Lines are peeled in a fixed order: transport framing, syslog priority
//! header, timestamp. Whatever is left is the payload, which goes through a
//! cascade of sub-parsers where the first match wins:
//!
//! ```text
//! embedded JSON → heroku " - - " logfmt → tick-quoted logfmt
//!   → prefixed logfmt → plain " - - " message → whole payload as name
//! ```
//!
//! A line without a recognisable timestamp produces no record.

use crate::logfmt;
use crate::record::{format_number, Record};
use crate::timestamp::{self, TimestampFormat, DEFAULT_FORMATS};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tokio::sync::mpsc;

/// Separator between the name and the body in Heroku-style lines.
const DYNO_SEPARATOR: &str = " - - ";

/// Why a line produced no record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("empty line")]
    Empty,

    #[error("could not find timestamp in line `{0}`")]
    NoTimestamp(String),
}

/// Heuristic line parser. Cheap to clone; holds only the timestamp table.
#[derive(Debug, Clone)]
pub struct Parser {
    formats: Vec<TimestampFormat>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// Parser with the [`DEFAULT_FORMATS`] timestamp table.
    pub fn new() -> Self {
        Self::with_formats(DEFAULT_FORMATS.to_vec())
    }

    /// Parser with a custom, ordered timestamp table.
    pub fn with_formats(formats: Vec<TimestampFormat>) -> Self {
        Self { formats }
    }

    /// Parse one line.
    pub fn parse(&self, line: &str) -> Result<Record, ParseError> {
        // Some Heroku lines carry a stray leading `d `.
        let line = line.strip_prefix("d ").unwrap_or(line);

        let mut tokens = tokenize(line);
        if tokens.is_empty() {
            return Err(ParseError::Empty);
        }

        let mut record = Record::new(DateTime::<Utc>::default(), "");

        // RFC 6587 octet counting: `LEN MSG` where LEN counts the rest.
        if let Ok(length) = tokens[0].1.parse::<usize>() {
            if length == line.len() - tokens[0].1.len() {
                tokens.remove(0);
            }
        }

        // RFC 5424 PRIVAL: `<N>` with N = facility << 3 | severity.
        if let Some(prival) = tokens.first().and_then(|(_, t)| prival(t)) {
            record.insert("syslog.severity", (prival & 0x7).to_string());
            record.insert("syslog.facility", (prival >> 3).to_string());
            tokens.remove(0);
        }

        let Some((index, time)) = self.find_timestamp(&tokens) else {
            return Err(ParseError::NoTimestamp(line.to_string()));
        };
        record.time = time;

        // The payload keeps the line's own spacing around everything but the
        // peeled tokens.
        let (at, token) = tokens[index];
        let before = line[tokens[0].0..at].trim_end();
        let after = line[at + token.len()..].trim();
        let payload = match (before.is_empty(), after.is_empty()) {
            (true, _) => after.to_string(),
            (_, true) => before.to_string(),
            _ => format!("{before} {after}"),
        };

        parse_payload(&payload, &mut record);
        Ok(record)
    }

    fn find_timestamp(&self, tokens: &[(usize, &str)]) -> Option<(usize, DateTime<Utc>)> {
        tokens.iter().enumerate().find_map(|(i, (_, token))| {
            let token = timestamp::unwrap_quoted(token);
            self.formats
                .iter()
                .find_map(|format| format.parse(token))
                .map(|time| (i, time))
        })
    }

    /// Parser stage: read lines until `input` closes, forward records.
    ///
    /// Returning drops `output`, which closes the next stage's input.
    pub async fn run(&self, mut input: mpsc::Receiver<String>, output: mpsc::Sender<Record>) {
        let mut parsed = 0usize;
        let mut rejected = 0usize;

        while let Some(line) = input.recv().await {
            match self.parse(&line) {
                Ok(record) => {
                    parsed += 1;
                    if output.send(record).await.is_err() {
                        tracing::debug!("parser output closed early");
                        break;
                    }
                }
                Err(ParseError::Empty) => {}
                Err(err) => {
                    rejected += 1;
                    tracing::warn!("{err}");
                }
            }
        }

        tracing::debug!(parsed, rejected, "parser stage finished");
    }
}

/// Whitespace-separated tokens with their byte offsets into `line`.
fn tokenize(line: &str) -> Vec<(usize, &str)> {
    let mut tokens = Vec::new();
    let mut start = None;

    for (i, c) in line.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                tokens.push((s, &line[s..i]));
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        tokens.push((s, &line[s..]));
    }

    tokens
}

fn prival(token: &str) -> Option<u32> {
    let rest = token.strip_prefix('<')?;
    let end = rest.find('>')?;
    rest[..end].parse().ok()
}

// ---------------------------------------------------------------------------
// Payload cascade
// ---------------------------------------------------------------------------

fn parse_payload(payload: &str, record: &mut Record) {
    let matched = try_embedded_json(payload, record)
        || try_dyno_logfmt(payload, record)
        || try_tick_quoted_logfmt(payload, record)
        || try_prefixed_logfmt(payload, record)
        || try_plain_message(payload, record);

    if !matched {
        record.name = payload.to_string();
    }
}

/// `NAME {"json": "object"}`
fn try_embedded_json(payload: &str, record: &mut Record) -> bool {
    let Some(brace) = payload.find('{') else {
        return false;
    };

    let Ok(object) = serde_json::from_str::<Map<String, Value>>(&payload[brace..]) else {
        return false;
    };

    record.name = payload[..brace]
        .trim_matches(|c| c == ' ' || c == '\t' || c == '-')
        .to_string();
    flatten_json("", object, record);
    true
}

fn flatten_json(prefix: &str, object: Map<String, Value>, record: &mut Record) {
    for (key, value) in object {
        let key = if prefix.is_empty() {
            key
        } else {
            format!("{prefix}.{key}")
        };

        match value {
            Value::Bool(b) => record.insert(key, b.to_string()),
            Value::Number(n) => {
                let text = n.as_f64().map(format_number).unwrap_or_else(|| n.to_string());
                record.insert(key, text);
            }
            Value::String(s) => record.insert(key, s),
            Value::Null => record.insert(key, ""),
            Value::Object(nested) => flatten_json(&key, nested, record),
            other @ Value::Array(_) => record.insert(key, format!("UNSUPPORTED: {other}")),
        }
    }
}

/// Heroku dyno output: `NAME - - key=val key=val key=val …`
fn try_dyno_logfmt(payload: &str, record: &mut Record) -> bool {
    let Some((name, body)) = payload.split_once(DYNO_SEPARATOR) else {
        return false;
    };
    if name.contains('=') {
        return false;
    }

    // Three is an arbitrary threshold that keeps prose with a stray `=` out.
    if body.matches('=').count() < 3 {
        return false;
    }

    record.name = name.to_string();
    decode_into(body, record);
    true
}

/// Logentries serialises values as `a='b'` rather than `a="b"`.
fn try_tick_quoted_logfmt(payload: &str, record: &mut Record) -> bool {
    let ticks = payload.matches("='").count();
    let quotes = payload.matches("=\"").count();
    if ticks <= quotes {
        return false;
    }

    let swapped: String = payload
        .chars()
        .map(|c| match c {
            '\'' => '"',
            '"' => '\'',
            c => c,
        })
        .collect();

    try_prefixed_logfmt(&swapped, record)
}

/// `some prefix text key=value key=value`
fn try_prefixed_logfmt(payload: &str, record: &mut Record) -> bool {
    let Some(equals) = payload.find('=') else {
        return false;
    };

    let mut key_start = equals;
    // A quoted key (`"my key"=v`) may itself contain whitespace.
    if payload[..equals].ends_with('"') {
        if let Some(open) = payload[..equals - 1].rfind('"') {
            key_start = open;
        }
    }

    let boundary = payload[..key_start]
        .rfind(char::is_whitespace)
        .unwrap_or(0);

    record.name = payload[..boundary].trim_end().to_string();
    decode_into(&payload[boundary..], record);
    true
}

/// `NAME - - free text message`
fn try_plain_message(payload: &str, record: &mut Record) -> bool {
    if payload.contains('=') {
        return false;
    }
    let Some((name, message)) = payload.split_once(DYNO_SEPARATOR) else {
        return false;
    };

    record.name = name.to_string();
    record.insert("message", message);
    true
}

fn decode_into(text: &str, record: &mut Record) {
    for (key, value) in logfmt::decode(text) {
        record.insert(key, value);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
