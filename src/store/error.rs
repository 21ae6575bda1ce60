//! Snapshot store error types.

use std::path::PathBuf;

/// Errors that can occur during snapshot store operations.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// Failed to open or create database.
    #[error("Failed to open database at {path}: {source}")]
    DatabaseOpen {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Failed to execute SQL.
    #[error("Database query failed: {0}")]
    Query(#[from] rusqlite::Error),

    /// Failed to serialize a snapshot to JSON.
    #[error("JSON serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Blocking task was cancelled.
    #[error("Blocking task cancelled")]
    TaskCancelled,

    /// Failed to create parent directory.
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
