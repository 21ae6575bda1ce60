//! Snapshot store with async `SQLite` operations.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::Mutex;

use super::error::StoreError;
use super::schema::SCHEMA;
use crate::inference::UpdateSnapshot;

/// Well-known key the current snapshot is stored under.
pub const STATUS_KEY: &str = "update_status";

/// Returns the default path for the snapshot database.
///
/// This is `~/.local/share/update-monitor/status.db` on Unix systems.
#[must_use]
pub fn default_store_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("update-monitor")
        .join("status.db")
}

/// Stores the latest [`UpdateSnapshot`] under a single key.
///
/// Uses `SQLite` for persistent storage with async operations via `spawn_blocking`.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl SnapshotStore {
    /// Open a snapshot store at the specified path.
    ///
    /// Creates parent directories if they don't exist and initializes the schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or the schema cannot be applied.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|source| StoreError::CreateDir {
                        path: parent.to_path_buf(),
                        source,
                    })?;
            }
        }

        let path_clone = path.clone();
        let conn = tokio::task::spawn_blocking(move || -> Result<Connection, StoreError> {
            let conn =
                Connection::open(&path_clone).map_err(|source| StoreError::DatabaseOpen {
                    path: path_clone,
                    source,
                })?;
            conn.execute_batch(SCHEMA)?;
            Ok(conn)
        })
        .await
        .map_err(|_| StoreError::TaskCancelled)??;

        tracing::debug!(path = %path.display(), "Opened snapshot store");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: Some(path),
        })
    }

    /// Open an in-memory snapshot store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created or the schema cannot be applied.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let conn = tokio::task::spawn_blocking(|| -> Result<Connection, StoreError> {
            let conn = Connection::open_in_memory()?;
            conn.execute_batch(SCHEMA)?;
            Ok(conn)
        })
        .await
        .map_err(|_| StoreError::TaskCancelled)??;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: None,
        })
    }

    /// Returns the path to the database, if opened from a file.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Save a snapshot, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be serialized or written.
    pub async fn save(&self, snapshot: &UpdateSnapshot) -> Result<(), StoreError> {
        let value = serde_json::to_string(snapshot)?;
        let updated_at = Utc::now().to_rfc3339();

        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || -> Result<(), StoreError> {
            let conn = conn.blocking_lock();
            conn.execute(
                "INSERT OR REPLACE INTO kv_snapshots (key, value, updated_at) VALUES (?1, ?2, ?3)",
                params![STATUS_KEY, value, updated_at],
            )?;
            Ok(())
        })
        .await
        .map_err(|_| StoreError::TaskCancelled)??;

        tracing::debug!(phase = %snapshot.phase, "Saved update snapshot");
        Ok(())
    }

    /// Load the stored snapshot, if any.
    ///
    /// A stored value that no longer decodes is logged and treated as absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn load(&self) -> Result<Option<UpdateSnapshot>, StoreError> {
        let conn = self.conn.clone();
        let value = tokio::task::spawn_blocking(move || -> Result<Option<String>, StoreError> {
            let conn = conn.blocking_lock();
            let value = conn
                .query_row(
                    "SELECT value FROM kv_snapshots WHERE key = ?1",
                    params![STATUS_KEY],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(value)
        })
        .await
        .map_err(|_| StoreError::TaskCancelled)??;

        Ok(value.and_then(|json| match serde_json::from_str(&json) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding undecodable stored snapshot");
                None
            }
        }))
    }

    /// Load the stored snapshot or the initial idle snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn load_or_default(&self) -> Result<UpdateSnapshot, StoreError> {
        Ok(self.load().await?.unwrap_or_else(UpdateSnapshot::initial))
    }

    /// Remove the stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn clear(&self) -> Result<(), StoreError> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || -> Result<(), StoreError> {
            let conn = conn.blocking_lock();
            conn.execute(
                "DELETE FROM kv_snapshots WHERE key = ?1",
                params![STATUS_KEY],
            )?;
            Ok(())
        })
        .await
        .map_err(|_| StoreError::TaskCancelled)?
    }

    /// Replace the stored snapshot with the initial one if it is older than `max_age`.
    ///
    /// Returns `true` if a reset happened.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be read or written.
    pub async fn reset_if_stale(&self, max_age: Duration) -> Result<bool, StoreError> {
        let Some(current) = self.load().await? else {
            return Ok(false);
        };

        // A timestamp in the future is never stale
        let Ok(age) = Utc::now()
            .signed_duration_since(current.inferred_at)
            .to_std()
        else {
            return Ok(false);
        };
        if age <= max_age {
            return Ok(false);
        }

        tracing::info!(
            age_secs = age.as_secs(),
            phase = %current.phase,
            "Stored status is stale, resetting to idle"
        );
        self.save(&UpdateSnapshot::initial()).await?;
        Ok(true)
    }
}
