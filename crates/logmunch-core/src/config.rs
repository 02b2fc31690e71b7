//! Configuration types for logmunch.
//!
//! [`Config::load`] reads `~/.config/logmunch/config.toml` (or an explicit
//! path), layered over hardcoded defaults. The default file is created on
//! first run. [`Config::defaults`] returns the same defaults without touching
//! the filesystem (useful in tests).

use crate::duration::{parse_duration, DurationError};
use crate::pipeline::DEFAULT_QUEUE_CAPACITY;
use chrono::TimeDelta;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Embedded defaults
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r#"
[pipeline]
queue_capacity = 100

[query]
source = "file:-"
start  = "-24h"
end    = "0"

[logentries]
base_url = "https://pull.logentries.com"

# Default locator per protocol. A `--source` locator overrides every field
# it sets, e.g.
#
# [sources]
# logentries = "logentries://:ACCOUNT_KEY@/Production/api"
[sources]
"#;

// ---------------------------------------------------------------------------
// Public config types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub query: QueryConfig,
    /// Protocol → default locator.
    #[serde(default)]
    pub sources: BTreeMap<String, String>,
    #[serde(default)]
    pub logentries: LogEntriesConfig,
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_queue_capacity() -> usize { DEFAULT_QUEUE_CAPACITY }

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// `[query]` section. `start` and `end` are offsets from now.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryConfig {
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default = "default_start")]
    pub start: String,
    #[serde(default = "default_end")]
    pub end: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

fn default_source() -> String { "file:-".to_string() }
fn default_start() -> String { "-24h".to_string() }
fn default_end() -> String { "0".to_string() }

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            start: default_start(),
            end: default_end(),
            limit: None,
        }
    }
}

impl QueryConfig {
    pub fn start_offset(&self) -> Result<TimeDelta, DurationError> {
        parse_duration(&self.start)
    }

    pub fn end_offset(&self) -> Result<TimeDelta, DurationError> {
        parse_duration(&self.end)
    }
}

/// `[logentries]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct LogEntriesConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String { "https://pull.logentries.com".to_string() }

impl Default for LogEntriesConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Config {
    /// Load `path`, or `~/.config/logmunch/config.toml` when `None`, layered on
    /// top of the built-in defaults.
    ///
    /// The default location is created with the defaults if missing; an
    /// explicit path must exist.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => {
                let path = config_path();
                if !path.exists() {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, DEFAULT_CONFIG.trim_start())?;
                    tracing::debug!(path = %path.display(), "wrote default config");
                }
                (path, false)
            }
        };

        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(config::File::from(path.as_path()).required(required))
            .build()?
            .try_deserialize()
            .map_err(Into::into)
    }

    /// Return the built-in defaults without touching the filesystem.
    pub fn defaults() -> Self {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .build()
            .expect("built-in default config must be valid TOML")
            .try_deserialize()
            .expect("built-in default config must deserialize correctly")
    }
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

fn config_path() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_string()))
                .join(".config")
        })
        .join("logmunch")
        .join("config.toml")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
