//! Block log error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during block log operations.
#[derive(Debug, Error)]
pub enum BlockLogError {
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    #[error("failed to create log file {}: {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
