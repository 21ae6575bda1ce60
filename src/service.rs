//! Request dispatch for the update monitor.
//!
//! Routes each [`UpdateRequest`] to log inference, the snapshot store or the
//! update trigger. Holds no mutable state of its own; the store is the only
//! shared resource.

use std::time::Duration;

use crate::inference::{InferenceThresholds, LogInference, UpdateSnapshot};
use crate::ipc::{UpdateRequest, UpdateResponse};
use crate::source::lines_from_text;
use crate::store::{SnapshotStore, StoreError};
use crate::trigger::UpdateTrigger;

/// Handles update requests against a snapshot store.
#[derive(Debug, Clone)]
pub struct UpdateService {
    store: SnapshotStore,
    trigger: UpdateTrigger,
    inference: LogInference,
}

impl UpdateService {
    /// Create a service with default inference windows.
    #[must_use]
    pub fn new(store: SnapshotStore, trigger: UpdateTrigger) -> Self {
        Self {
            store,
            trigger,
            inference: LogInference::new(),
        }
    }

    /// Use custom inference windows.
    #[must_use]
    pub fn with_thresholds(mut self, thresholds: InferenceThresholds) -> Self {
        self.inference = LogInference::with_thresholds(thresholds);
        self
    }

    /// Get the underlying store.
    #[must_use]
    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Reset a stored status older than `stale_after` back to idle.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or written.
    pub async fn initialize(&self, stale_after: Duration) -> Result<(), StoreError> {
        self.store.reset_if_stale(stale_after).await?;
        Ok(())
    }

    /// Handle one request.
    pub async fn handle(&self, request: UpdateRequest) -> UpdateResponse {
        match request {
            UpdateRequest::ManualLogInput(text) => self.handle_manual_log_input(&text).await,
            UpdateRequest::GetUpdateStatus => self.handle_get_update_status().await,
            UpdateRequest::CheckForUpdates => self.handle_check_for_updates(),
        }
    }

    async fn handle_manual_log_input(&self, text: &str) -> UpdateResponse {
        let lines = lines_from_text(text);
        let snapshot = self.inference.infer(&lines);

        tracing::info!(
            lines = lines.len(),
            phase = %snapshot.phase,
            "Inferred update status from log input"
        );

        match self.store.save(&snapshot).await {
            Ok(()) => UpdateResponse::ok(snapshot),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to save update status");
                UpdateResponse::failure(e.to_string())
            }
        }
    }

    async fn handle_get_update_status(&self) -> UpdateResponse {
        match self.store.load_or_default().await {
            Ok(snapshot) => UpdateResponse::ok(snapshot),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load update status, reporting idle");
                UpdateResponse::ok(UpdateSnapshot::initial())
            }
        }
    }

    /// Fire and forget: the opener is not awaited and failures are only logged.
    fn handle_check_for_updates(&self) -> UpdateResponse {
        if let Err(e) = self.trigger.launch() {
            tracing::warn!(error = %e, "Failed to open settings page");
        }
        UpdateResponse::ack()
    }
}
