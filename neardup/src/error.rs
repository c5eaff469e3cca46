//! Error types for the neardup library.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Top-level error enum for configuration and whole-batch failures.
///
/// Failures scoped to a single document (an unreadable input file, a failed
/// output write) are not raised through this type; they are recorded in the
/// report of the batch operation and the batch carries on.
#[derive(Debug, Error)]
pub enum DedupError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl DedupError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        DedupError::Config(message.into())
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        DedupError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, DedupError>;
