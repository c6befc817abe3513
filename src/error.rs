use std::path::PathBuf;

use crate::config::{ConfigError, LimitError};
use crate::core::RecordError;

/// Failures of the command-line entry points.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("failed to read {path}: {source}")]
    ReadRecords {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid records JSON in {path}: {source}")]
    ParseRecords {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("request rejected: {0}")]
    Limit(#[from] LimitError),

    #[error("invalid record: {0}")]
    InvalidRecord(#[from] RecordError),

    #[error("failed to encode result: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}
