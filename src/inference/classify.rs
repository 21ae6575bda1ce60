//! Per-line classifiers for update_engine log output.
//!
//! Each classifier looks at exactly one line and returns `None` when the
//! line carries no evidence of its kind.

use std::sync::LazyLock;

use regex::Regex;

use super::types::ProgressRecord;

/// Literal marker every error line carries.
pub const ERROR_MARKER: &str = "ERROR";

// ASCII digits only.
static PROGRESS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"Completed\s+([0-9]+)/([0-9]+)\s+operations\s+\(([0-9]+)%\),\s+([0-9]+)/([0-9]+)\s+bytes\s+downloaded\s+\(([0-9]+)%\),\s+overall\s+progress\s+([0-9]+)%",
    )
    .expect("valid regex")
});

static ERROR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ERROR\s+update_engine:.*?\]\s+(.+)$").expect("valid regex"));

/// Extract a progress record from a progress line.
///
/// The operations and bytes percentages are matched but not kept. Counters
/// that overflow their integer type count as no match.
#[must_use]
pub fn parse_progress_line(line: &str) -> Option<ProgressRecord> {
    let caps = PROGRESS_RE.captures(line)?;

    Some(ProgressRecord {
        operations_completed: caps[1].parse().ok()?,
        operations_total: caps[2].parse().ok()?,
        bytes_downloaded: caps[4].parse().ok()?,
        bytes_total: caps[5].parse().ok()?,
        percent: caps[7].parse().ok()?,
    })
}

/// Extract the message following an `ERROR update_engine:...]` tag.
///
/// Lines with the marker but without the tag yield nothing.
#[must_use]
pub fn parse_error_line(line: &str) -> Option<String> {
    if !line.contains(ERROR_MARKER) {
        return None;
    }

    let caps = ERROR_RE.captures(line)?;
    let message = caps[1].trim();
    if message.is_empty() {
        None
    } else {
        Some(message.to_string())
    }
}
