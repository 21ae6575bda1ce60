//! Status types derived from update_engine log lines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::format::format_bytes;

/// Progress counters extracted from a single progress line.
///
/// Values are passed through as written in the log; `bytes_downloaded` may
/// exceed `bytes_total` when upstream data is inconsistent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    /// Overall progress percentage.
    pub percent: u32,
    /// Bytes downloaded so far.
    pub bytes_downloaded: u64,
    /// Total bytes to download, 0 when unknown.
    pub bytes_total: u64,
    /// Operations completed so far.
    pub operations_completed: u64,
    /// Total operations, 0 when unknown.
    pub operations_total: u64,
}

/// Coarse lifecycle stage of an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Checking,
    Downloading,
    Installing,
    /// Never produced by inference; only reachable as an externally supplied value.
    UpToDate,
    Error,
}

impl Phase {
    /// Get the string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Checking => "checking",
            Self::Downloading => "downloading",
            Self::Installing => "installing",
            Self::UpToDate => "up_to_date",
            Self::Error => "error",
        }
    }

    /// Whether the update is still moving and the status is expected to change.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Checking | Self::Downloading | Self::Installing)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fully derived status value produced by a single inference run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateSnapshot {
    /// Inferred phase.
    pub phase: Phase,
    /// Most recent progress record in the window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<ProgressRecord>,
    /// Most recent tagged error message in the window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// When the inference ran.
    pub inferred_at: DateTime<Utc>,
    /// Human readable total update size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub human_size_label: Option<String>,
}

impl UpdateSnapshot {
    /// Build a snapshot, deriving the size label from the progress record.
    #[must_use]
    pub fn new(
        phase: Phase,
        progress: Option<ProgressRecord>,
        error_message: Option<String>,
        inferred_at: DateTime<Utc>,
    ) -> Self {
        let human_size_label = progress.map(|p| format_bytes(p.bytes_total));
        Self {
            phase,
            progress,
            error_message,
            inferred_at,
            human_size_label,
        }
    }

    /// Status used when no log data has been seen yet.
    #[must_use]
    pub fn initial() -> Self {
        Self::new(Phase::Idle, None, None, Utc::now())
    }

    /// Whether two snapshots carry the same status, ignoring `inferred_at`.
    #[must_use]
    pub fn same_status(&self, other: &Self) -> bool {
        self.phase == other.phase
            && self.progress == other.progress
            && self.error_message == other.error_message
            && self.human_size_label == other.human_size_label
    }
}
