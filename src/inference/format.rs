//! Human readable byte counts.

const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

/// Format a byte count with two decimals, stepping through B/KB/MB/GB.
///
/// Values past 1024 GB stay in GB.
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    #[allow(clippy::cast_precision_loss)]
    let mut size = bytes as f64;
    let mut unit = 0;

    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    format!("{size:.2} {}", UNITS[unit])
}
