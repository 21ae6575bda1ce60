//! Log source error types.

use std::path::PathBuf;

/// Errors that can occur while acquiring log text.
#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    /// Log file does not exist.
    #[error("Log file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied reading the log file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SourceError {
    /// Classify an I/O error raised while opening `path`.
    pub(crate) fn from_io(path: PathBuf, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            _ => Self::Io(err),
        }
    }
}
