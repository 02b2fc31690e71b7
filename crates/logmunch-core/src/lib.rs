//! Core types for logmunch.
//!
//! A raw line becomes a [`Record`] in the [`Parser`], is mutated or dropped by
//! a [`FilterChain`], and leaves through a drain. The [`Pipeline`] wires the
//! parser and filter stages together over bounded channels:
//!
//! ```text
//! Source ──► Parser ──► FilterChain ──► Drain
//! ```

pub mod config;
pub mod duration;
pub mod filter;
pub mod logfmt;
pub mod parser;
pub mod pipeline;
pub mod query;
pub mod record;
pub mod script;
pub mod timestamp;

pub use filter::{Filter, FilterChain, FilterError};
pub use parser::{ParseError, Parser};
pub use pipeline::Pipeline;
pub use query::{Query, QueryGroup};
pub use record::Record;
pub use script::Script;
