use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("invalid source locator `{0}`")]
    InvalidLocator(String),

    #[error("unknown source `{0}`")]
    UnknownProtocol(String),

    #[error("no LogEntries password set")]
    MissingCredentials,

    #[error("LogEntries returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error(transparent)]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
