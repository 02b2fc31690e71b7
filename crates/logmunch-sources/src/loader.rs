//! Resolves a locator against per-protocol defaults and picks its source.

use crate::error::SourceError;
use crate::file::FileSource;
use crate::locator::Locator;
use crate::logentries::{LogEntriesSource, DEFAULT_BASE_URL};
use crate::Source;
use logmunch_core::config::Config;
use logmunch_core::Query;
use std::collections::BTreeMap;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tokio::sync::mpsc;

/// Protocol → default locator table.
#[derive(Debug, Clone)]
pub struct SourceLoader {
    defaults: BTreeMap<String, Locator>,
    logentries_base_url: String,
}

impl Default for SourceLoader {
    fn default() -> Self {
        Self {
            defaults: BTreeMap::new(),
            logentries_base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl SourceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loader seeded from the `[sources]` and `[logentries]` config sections.
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        let mut loader = Self::new().with_logentries_base_url(config.logentries.base_url.clone());
        for text in config.sources.values() {
            loader.add_default(text.parse()?);
        }
        Ok(loader)
    }

    pub fn with_logentries_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.logentries_base_url = base_url.into();
        self
    }

    pub fn with_default(mut self, locator: Locator) -> Self {
        self.add_default(locator);
        self
    }

    /// Register `locator` as the default for its scheme, replacing any earlier
    /// one.
    pub fn add_default(&mut self, locator: Locator) {
        self.defaults.insert(locator.scheme.clone(), locator);
    }

    pub fn default_for(&self, scheme: &str) -> Option<&Locator> {
        self.defaults.get(scheme)
    }

    /// Read URL-per-line default files such as `./.logmunch`.
    ///
    /// Missing files and unparseable lines are skipped; later lines win.
    pub fn load_files<P: AsRef<Path>>(&mut self, paths: &[P]) -> Result<(), SourceError> {
        for path in paths {
            let path = path.as_ref();
            let file = match std::fs::File::open(path) {
                Ok(file) => file,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };

            for line in BufReader::new(file).lines() {
                let line = line?;
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                match line.parse::<Locator>() {
                    Ok(locator) => self.add_default(locator),
                    Err(e) => tracing::debug!(path = %path.display(), error = %e, "skipping line"),
                }
            }
            tracing::debug!(path = %path.display(), "loaded source defaults");
        }
        Ok(())
    }

    /// Parse `text`, merge it over its scheme's default and pick the source.
    ///
    /// Unknown schemes and LogEntries locators without a password fail here,
    /// before anything is streamed.
    pub fn resolve(&self, text: &str) -> Result<(Source, Locator), SourceError> {
        let given: Locator = text.parse()?;
        let locator = match self.defaults.get(&given.scheme) {
            Some(default) => default.merged_with(&given),
            None => given,
        };

        let source = match locator.scheme.as_str() {
            "file" => Source::File(FileSource),
            "logentries" => {
                if locator.password.is_none() {
                    return Err(SourceError::MissingCredentials);
                }
                Source::LogEntries(LogEntriesSource::new(self.logentries_base_url.clone()))
            }
            other => return Err(SourceError::UnknownProtocol(other.to_string())),
        };

        tracing::debug!(%locator, "resolved source");
        Ok((source, locator))
    }

    /// [`resolve`](Self::resolve) then fetch. `out` is closed on every path.
    pub async fn fetch(
        &self,
        text: &str,
        query: Query,
        out: mpsc::Sender<String>,
    ) -> Result<Query, SourceError> {
        let (source, locator) = self.resolve(text)?;
        source.fetch(&locator, query, out).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn loader() -> SourceLoader {
        SourceLoader::new()
            .with_default("logentries://:logentries_password@".parse().unwrap())
            .with_default("file:-".parse().unwrap())
    }

    #[test]
    fn merges_defaults_into_locator() {
        let (source, locator) = loader().resolve("logentries:///Path/name/to/fetch").unwrap();
        assert!(matches!(source, Source::LogEntries(_)));
        assert_eq!(locator.password.as_deref(), Some("logentries_password"));
        assert_eq!(locator.path, "/Path/name/to/fetch");
    }

    #[test]
    fn opaque_path_is_merged_too() {
        let (_, locator) = loader().resolve("logentries:Production/api").unwrap();
        assert_eq!(locator.password.as_deref(), Some("logentries_password"));
        assert_eq!(locator.path, "Production/api");
    }

    #[test]
    fn file_default_is_stdin() {
        let (source, locator) = loader().resolve("file:").unwrap();
        assert!(matches!(source, Source::File(_)));
        assert!(locator.is_stdin());
    }

    #[test]
    fn unknown_protocol() {
        assert!(matches!(
            loader().resolve("gopher://host/x"),
            Err(SourceError::UnknownProtocol(p)) if p == "gopher"
        ));
    }

    #[test]
    fn logentries_needs_a_password() {
        assert!(matches!(
            SourceLoader::new().resolve("logentries:Production/api"),
            Err(SourceError::MissingCredentials)
        ));
    }

    #[test]
    fn loads_url_per_line_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".logmunch");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "# defaults").unwrap();
        writeln!(file, "logentries://:from_file@/Production/api").unwrap();
        writeln!(file, "not a locator").unwrap();

        let mut loader = SourceLoader::new();
        loader
            .load_files(&[dir.path().join("missing"), path])
            .unwrap();

        let default = loader.default_for("logentries").unwrap();
        assert_eq!(default.password.as_deref(), Some("from_file"));
        assert_eq!(default.path, "/Production/api");
    }

    #[test]
    fn from_config_reads_sources_table() {
        let mut config = Config::defaults();
        config
            .sources
            .insert("logentries".into(), "logentries://:cfg@/App".into());
        config.logentries.base_url = "http://127.0.0.1:1".into();

        let loader = SourceLoader::from_config(&config).unwrap();
        let (source, locator) = loader.resolve("logentries:").unwrap();
        assert_eq!(locator.password.as_deref(), Some("cfg"));
        match source {
            Source::LogEntries(le) => assert_eq!(le.base_url(), "http://127.0.0.1:1"),
            other => panic!("unexpected source {other:?}"),
        }
    }
}
