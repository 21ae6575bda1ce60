//! Log-to-status inference.
//!
//! Derives one [`UpdateSnapshot`] from a batch of update_engine log lines.
//! Only the most recent lines are considered: a wider window for progress
//! and error extraction, a narrower one for phase classification.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::classify::{parse_error_line, parse_progress_line, ERROR_MARKER};
use super::types::{Phase, ProgressRecord, UpdateSnapshot};

/// Diagnostic counter line that mentions errors without being one.
const BENIGN_ERROR_COUNTER: &str = "Error counter";
const DOWNLOADING_MARKERS: &[&str] = &["overall progress"];
const INSTALLING_MARKERS: &[&str] = &["installing", "ApplyPayload"];
const CHECKING_MARKERS: &[&str] = &["Checking for update", "Periodic check", "update attempt"];

/// Window sizes used during inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceThresholds {
    /// Number of trailing lines searched for progress and errors.
    pub window_size: usize,
    /// Number of trailing lines of that window used for phase detection.
    pub phase_window_size: usize,
}

impl Default for InferenceThresholds {
    fn default() -> Self {
        Self {
            window_size: 100,
            phase_window_size: 50,
        }
    }
}

/// Infers update status from log lines.
///
/// Holds no state between calls; identical input yields identical output
/// apart from `inferred_at`.
#[derive(Debug, Clone, Default)]
pub struct LogInference {
    thresholds: InferenceThresholds,
}

impl LogInference {
    /// Create an inference engine with default windows.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an inference engine with custom windows.
    #[must_use]
    pub fn with_thresholds(thresholds: InferenceThresholds) -> Self {
        Self { thresholds }
    }

    /// Get the current thresholds.
    #[must_use]
    pub fn thresholds(&self) -> &InferenceThresholds {
        &self.thresholds
    }

    /// Infer a snapshot from an ordered batch of lines, oldest first.
    #[must_use]
    pub fn infer<S: AsRef<str>>(&self, lines: &[S]) -> UpdateSnapshot {
        let window = tail(lines, self.thresholds.window_size);

        let (progress, error_message) = latest_evidence(window);
        let phase = detect_phase(tail(window, self.thresholds.phase_window_size));

        UpdateSnapshot::new(phase, progress, error_message, Utc::now())
    }
}

/// Infer a snapshot using the default windows.
#[must_use]
pub fn infer<S: AsRef<str>>(lines: &[S]) -> UpdateSnapshot {
    LogInference::new().infer(lines)
}

fn tail<S>(lines: &[S], len: usize) -> &[S] {
    &lines[lines.len().saturating_sub(len)..]
}

/// Find the most recent progress record and error message independently.
///
/// The scan runs newest to oldest and stops once both are found.
fn latest_evidence<S: AsRef<str>>(window: &[S]) -> (Option<ProgressRecord>, Option<String>) {
    let mut progress = None;
    let mut error_message = None;

    for line in window.iter().rev().map(AsRef::as_ref) {
        progress = progress.or_else(|| parse_progress_line(line));
        error_message = error_message.or_else(|| parse_error_line(line));
        if progress.is_some() && error_message.is_some() {
            break;
        }
    }

    (progress, error_message)
}

/// Classify the phase; the first matching rule wins.
///
/// Rules in order: error, downloading, installing, checking, idle.
/// [`Phase::UpToDate`] is never produced here.
fn detect_phase<S: AsRef<str>>(window: &[S]) -> Phase {
    let has_error = window.iter().map(AsRef::as_ref).any(|line| {
        line.contains(ERROR_MARKER) && !line.contains(BENIGN_ERROR_COUNTER)
    });

    if has_error {
        Phase::Error
    } else if contains_any(window, DOWNLOADING_MARKERS) {
        Phase::Downloading
    } else if contains_any(window, INSTALLING_MARKERS) {
        Phase::Installing
    } else if contains_any(window, CHECKING_MARKERS) {
        Phase::Checking
    } else {
        Phase::Idle
    }
}

fn contains_any<S: AsRef<str>>(window: &[S], markers: &[&str]) -> bool {
    window
        .iter()
        .any(|line| markers.iter().any(|marker| line.as_ref().contains(marker)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROGRESS_25: &str = "Completed 12/50 operations (24%), 1048576/4194304 bytes downloaded (25%), overall progress 25%";
    const PROGRESS_50: &str = "Completed 25/50 operations (50%), 2097152/4194304 bytes downloaded (50%), overall progress 50%";
    const TAGGED_ERROR: &str = "[ERROR update_engine: foo.cc(123)] Failed to apply payload";

    fn noise(count: usize) -> Vec<String> {
        (0..count)
            .map(|i| format!("[INFO:metrics.cc({i})] heartbeat"))
            .collect()
    }

    #[test]
    fn test_thresholds_default() {
        let thresholds = InferenceThresholds::default();
        assert_eq!(thresholds.window_size, 100);
        assert_eq!(thresholds.phase_window_size, 50);
    }

    #[test]
    fn test_with_thresholds() {
        let engine = LogInference::with_thresholds(InferenceThresholds {
            window_size: 10,
            phase_window_size: 5,
        });
        assert_eq!(engine.thresholds().window_size, 10);
    }

    #[test]
    fn test_infer_empty() {
        let snapshot = infer::<&str>(&[]);
        assert_eq!(snapshot.phase, Phase::Idle);
        assert!(snapshot.progress.is_none());
        assert!(snapshot.error_message.is_none());
        assert!(snapshot.human_size_label.is_none());
    }

    #[test]
    fn test_infer_noise_only() {
        let snapshot = infer(&noise(30));
        assert_eq!(snapshot.phase, Phase::Idle);
        assert!(snapshot.progress.is_none());
    }

    #[test]
    fn test_infer_progress() {
        let snapshot = infer(&["Checking for update", PROGRESS_25]);
        assert_eq!(snapshot.phase, Phase::Downloading);
        let progress = snapshot.progress.unwrap();
        assert_eq!(progress.percent, 25);
        assert_eq!(progress.operations_completed, 12);
        assert_eq!(snapshot.human_size_label.as_deref(), Some("4.00 MB"));
    }

    #[test]
    fn test_infer_most_recent_progress_wins() {
        let snapshot = infer(&[PROGRESS_25, PROGRESS_50, PROGRESS_50]);
        assert_eq!(snapshot.progress.unwrap().percent, 50);
    }

    #[test]
    fn test_infer_error_and_progress_from_different_lines() {
        let snapshot = infer(&[
            TAGGED_ERROR,
            PROGRESS_25,
            "ERROR update_engine: bar.cc(9)] Newer failure",
            PROGRESS_50,
        ]);
        assert_eq!(snapshot.progress.unwrap().percent, 50);
        assert_eq!(snapshot.error_message.as_deref(), Some("Newer failure"));
    }

    #[test]
    fn test_infer_error_precedes_downloading() {
        let snapshot = infer(&[PROGRESS_25, TAGGED_ERROR]);
        assert_eq!(snapshot.phase, Phase::Error);
        assert_eq!(
            snapshot.error_message.as_deref(),
            Some("Failed to apply payload")
        );
    }

    #[test]
    fn test_infer_error_counter_is_benign() {
        let snapshot = infer(&["[INFO] ERROR Error counter = 0", "Periodic check scheduled"]);
        assert_eq!(snapshot.phase, Phase::Checking);
    }

    #[test]
    fn test_infer_untagged_error_sets_phase_without_message() {
        let snapshot = infer(&["ERROR something went wrong"]);
        assert_eq!(snapshot.phase, Phase::Error);
        assert!(snapshot.error_message.is_none());
    }

    #[test]
    fn test_infer_installing() {
        assert_eq!(infer(&["Now installing the payload"]).phase, Phase::Installing);
        assert_eq!(infer(&["ApplyPayload started"]).phase, Phase::Installing);
    }

    #[test]
    fn test_infer_installing_precedes_checking() {
        let snapshot = infer(&["Checking for update", "ApplyPayload started"]);
        assert_eq!(snapshot.phase, Phase::Installing);
    }

    #[test]
    fn test_infer_checking_markers() {
        for line in ["Checking for update", "Periodic check", "Starting update attempt"] {
            assert_eq!(infer(&[line]).phase, Phase::Checking, "line: {line}");
        }
    }

    #[test]
    fn test_infer_never_reports_up_to_date() {
        let snapshot = infer(&["Update to version 1.2.3 is up to date", "No update available"]);
        assert_eq!(snapshot.phase, Phase::Idle);
    }

    #[test]
    fn test_progress_window_drops_old_lines() {
        let mut lines = vec![PROGRESS_25.to_string(), TAGGED_ERROR.to_string()];
        lines.extend(noise(100));

        let snapshot = infer(&lines);
        assert!(snapshot.progress.is_none());
        assert!(snapshot.error_message.is_none());
        assert_eq!(snapshot.phase, Phase::Idle);
    }

    #[test]
    fn test_phase_window_narrower_than_progress_window() {
        let mut lines = vec![PROGRESS_25.to_string()];
        lines.extend(noise(60));

        let snapshot = infer(&lines);
        // Progress is still within the last 100 lines
        assert_eq!(snapshot.progress.unwrap().percent, 25);
        // But outside the 50-line phase window
        assert_eq!(snapshot.phase, Phase::Idle);
    }

    #[test]
    fn test_custom_thresholds() {
        let engine = LogInference::with_thresholds(InferenceThresholds {
            window_size: 3,
            phase_window_size: 1,
        });
        let snapshot = engine.infer(&[PROGRESS_25, "a", "Checking for update", "idle line"]);
        assert!(snapshot.progress.is_none());
        assert_eq!(snapshot.phase, Phase::Idle);

        let snapshot = engine.infer(&[PROGRESS_25, "idle line", "Checking for update"]);
        assert_eq!(snapshot.progress.unwrap().percent, 25);
        assert_eq!(snapshot.phase, Phase::Checking);
    }

    #[test]
    fn test_phase_window_larger_than_window_is_clamped() {
        let engine = LogInference::with_thresholds(InferenceThresholds {
            window_size: 2,
            phase_window_size: 10,
        });
        let snapshot = engine.infer(&[TAGGED_ERROR, "a", "b"]);
        assert_eq!(snapshot.phase, Phase::Idle);
    }

    #[test]
    fn test_infer_is_deterministic() {
        let lines = [
            "Checking for update",
            PROGRESS_25,
            TAGGED_ERROR,
            "ApplyPayload started",
        ];
        let first = infer(&lines);
        let second = infer(&lines);
        assert!(first.same_status(&second));
    }
}
