//! Error types for vqa-eval.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for vqa-eval operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for vqa-eval operations.
///
/// Loaders never surface these to callers of the aggregation pass; they are
/// recorded as a [`crate::eval::SourceStatus`] and logged instead.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A configured source file does not exist.
    #[error("Source not found: {}", .0.display())]
    SourceMissing(PathBuf),

    /// Source parsed but has an unexpected shape.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid configuration.
    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Error::Parse(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Whether this error means the source was absent rather than unreadable.
    #[must_use]
    pub fn is_missing_source(&self) -> bool {
        match self {
            Error::SourceMissing(_) => true,
            Error::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(format!("{}", err))
    }
}
