//! Source locators: `scheme:…` strings naming a source and its settings.
//!
//! ```text
//! file:-                                  stdin
//! file:./relative.log                     relative path, kept verbatim
//! file:///var/log/app.log                 absolute path
//! logentries://:KEY@/Production/api       user info + path
//! logentries:Production/api               opaque path, merged with defaults
//! ```
//!
//! Parsing is done by hand rather than through [`url::Url`]: WHATWG parsing
//! rejects credentials without a host and rewrites `/./` in paths, both of
//! which appear in real locators.

use crate::error::SourceError;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Locator {
    pub scheme: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub host: String,
    pub path: String,
    pub query: String,
    pub fragment: String,
}

impl Locator {
    /// Copy of `self` with every field `overrides` sets replacing ours.
    ///
    /// User and password travel together: a locator naming either replaces
    /// both.
    pub fn merged_with(&self, overrides: &Locator) -> Locator {
        let mut merged = self.clone();
        merged.scheme = overrides.scheme.clone();

        if overrides.user.is_some() || overrides.password.is_some() {
            merged.user = overrides.user.clone();
            merged.password = overrides.password.clone();
        }
        if !overrides.host.is_empty() {
            merged.host = overrides.host.clone();
        }
        if !overrides.path.is_empty() {
            merged.path = overrides.path.clone();
        }
        if !overrides.query.is_empty() {
            merged.query = overrides.query.clone();
        }
        if !overrides.fragment.is_empty() {
            merged.fragment = overrides.fragment.clone();
        }
        merged
    }

    /// `true` for `file:-` and `file:`.
    pub fn is_stdin(&self) -> bool {
        self.path.is_empty() || self.path == "-"
    }
}

impl FromStr for Locator {
    type Err = SourceError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let invalid = || SourceError::InvalidLocator(text.to_string());

        let (scheme, rest) = text.split_once(':').ok_or_else(invalid)?;
        let valid_scheme = scheme.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        if !valid_scheme {
            return Err(invalid());
        }

        let mut locator = Locator {
            scheme: scheme.to_ascii_lowercase(),
            ..Default::default()
        };

        if locator.scheme == "file" {
            let path = rest.strip_prefix("//").unwrap_or(rest);
            // `file:/./x` is a relative path written as an absolute one.
            locator.path = match path.strip_prefix("/.") {
                Some(_) if path.len() > 2 => path[1..].to_string(),
                _ => path.to_string(),
            };
            return Ok(locator);
        }

        let (rest, fragment) = rest.split_once('#').unwrap_or((rest, ""));
        let (rest, query) = rest.split_once('?').unwrap_or((rest, ""));
        locator.fragment = fragment.to_string();
        locator.query = query.to_string();

        match rest.strip_prefix("//") {
            Some(hierarchical) => {
                let (authority, path) = match hierarchical.find('/') {
                    Some(at) => hierarchical.split_at(at),
                    None => (hierarchical, ""),
                };
                locator.path = path.to_string();

                let host = match authority.rsplit_once('@') {
                    Some((userinfo, host)) => {
                        let (user, password) = match userinfo.split_once(':') {
                            Some((user, password)) => (user, Some(password)),
                            None => (userinfo, None),
                        };
                        locator.user = Some(user.to_string());
                        locator.password = password.map(str::to_string);
                        host
                    }
                    None => authority,
                };
                locator.host = host.to_string();
            }
            None => locator.path = rest.to_string(),
        }

        Ok(locator)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.scheme)?;
        if self.scheme == "file" {
            return write!(f, "{}", self.path);
        }
        if self.user.is_some() || self.password.is_some() || !self.host.is_empty() {
            f.write_str("//")?;
            if let Some(user) = &self.user {
                f.write_str(user)?;
            }
            if self.password.is_some() {
                // Never echo secrets into logs.
                f.write_str(":***")?;
            }
            if self.user.is_some() || self.password.is_some() {
                f.write_str("@")?;
            }
            f.write_str(&self.host)?;
        }
        f.write_str(&self.path)?;
        if !self.query.is_empty() {
            write!(f, "?{}", self.query)?;
        }
        if !self.fragment.is_empty() {
            write!(f, "#{}", self.fragment)?;
        }
        Ok(())
    }
}
