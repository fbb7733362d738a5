//! Custom error types for motivate

use thiserror::Error;

/// Main error type for motivate operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Embedding error: {0}")]
    Embedding(String),

    /// An upstream model service answered with an error or an unusable body
    #[error("{service} service error: {message}")]
    Upstream { service: String, message: String },

    /// An upstream model service did not answer in time
    #[error("{service} service timed out after {secs}s")]
    Timeout { service: String, secs: u64 },

    #[error("Invalid argument: {0}")]
    Validation(String),

    #[error("Index not found at {0}: run 'motivate ingest' first")]
    IndexNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map a transport failure from an upstream service, keeping timeouts distinct
    pub fn from_transport(service: &str, timeout_secs: u64, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout {
                service: service.to_string(),
                secs: timeout_secs,
            }
        } else {
            Error::Upstream {
                service: service.to_string(),
                message: err.to_string(),
            }
        }
    }

    /// True when the error came from a service call that exceeded its deadline
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

/// Result type alias for motivate
pub type Result<T> = std::result::Result<T, Error>;
