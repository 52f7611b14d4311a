use std::path::PathBuf;
use thiserror::Error;

/// Configuration-time error type.
///
/// Resolution itself never fails: every lookup degrades to "no opinion".
/// These errors only surface while normalizing options, where a bad alias
/// pattern or root glob indicates a configuration bug that should fail fast.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read config at {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config at {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid alias pattern {key:?}: {source}")]
    BadAliasPattern {
        key: String,
        #[source]
        source: regex_lite::Error,
    },

    #[error("Invalid root pattern {pattern:?}: {source}")]
    BadRootPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("Root pattern {pattern:?} matched no directories")]
    RootNotFound { pattern: String },

    #[error("{0}")]
    Other(String),
}

impl Error {
    #[must_use]
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}
