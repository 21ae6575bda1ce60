//! Colored CLI display of update status.

use std::io::{self, Write};

use chrono::{DateTime, Utc};
use owo_colors::{AnsiColors, OwoColorize};

use crate::inference::{format_bytes, Phase, ProgressRecord, UpdateSnapshot};

/// Width of the rendered progress bar, in cells.
const BAR_WIDTH: usize = 30;

/// Short label for a phase.
#[must_use]
pub fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Idle => "Idle",
        Phase::Checking => "Checking for updates",
        Phase::Downloading => "Downloading update",
        Phase::Installing => "Installing update",
        Phase::UpToDate => "Up to date",
        Phase::Error => "Update error",
    }
}

/// One-line description of a phase.
#[must_use]
pub fn phase_description(phase: Phase) -> &'static str {
    match phase {
        Phase::Idle => "No updates in progress",
        Phase::Checking => "Verifying available updates...",
        Phase::Downloading => "Update is being downloaded",
        Phase::Installing => "Update is being installed",
        Phase::UpToDate => "ChromeOS is updated",
        Phase::Error => "An error occurred during update",
    }
}

fn phase_color(phase: Phase) -> AnsiColors {
    match phase {
        Phase::Idle => AnsiColors::BrightBlack,
        Phase::Checking | Phase::Downloading | Phase::Installing => AnsiColors::Blue,
        Phase::UpToDate => AnsiColors::Green,
        Phase::Error => AnsiColors::Red,
    }
}

/// Describe how long ago `then` was, relative to `now`.
#[must_use]
pub fn format_last_checked(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = now.signed_duration_since(then).num_minutes();

    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{minutes} min ago")
    } else if minutes < 1440 {
        format!("{}h ago", minutes / 60)
    } else {
        format!("{}d ago", minutes / 1440)
    }
}

/// Render a text progress bar of `width` cells.
///
/// Percentages above 100 are drawn as full.
#[must_use]
pub fn progress_bar(percent: u32, width: usize) -> String {
    let percent = percent.min(100) as usize;
    let filled = percent * width / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

/// Format the counters of a progress record.
///
/// The `/ total` suffix is left out when a total is unknown (0).
#[must_use]
pub fn format_progress_details(progress: &ProgressRecord) -> Vec<String> {
    let mut downloaded = format!("Downloaded: {}", format_bytes(progress.bytes_downloaded));
    if progress.bytes_total > 0 {
        downloaded.push_str(&format!(" / {}", format_bytes(progress.bytes_total)));
    }

    let mut operations = format!("Operations: {}", progress.operations_completed);
    if progress.operations_total > 0 {
        operations.push_str(&format!(" / {}", progress.operations_total));
    }

    vec![downloaded, operations]
}

/// Print a snapshot as colored, human readable text.
pub fn print_snapshot(snapshot: &UpdateSnapshot) {
    let color = phase_color(snapshot.phase);

    println!(
        "{} {}",
        format!("[{}]", snapshot.phase.as_str().to_uppercase())
            .color(color)
            .bold(),
        phase_label(snapshot.phase).bold()
    );
    println!("  {}", phase_description(snapshot.phase).dimmed());
    println!(
        "  {} {}",
        "Last checked:".dimmed(),
        format_last_checked(snapshot.inferred_at, Utc::now())
    );

    if let Some(message) = &snapshot.error_message {
        println!("  {} {}", "[ERROR]".red().bold(), message.red());
    }

    if let Some(progress) = &snapshot.progress {
        println!(
            "  {} {}%",
            progress_bar(progress.percent, BAR_WIDTH).color(color),
            progress.percent
        );
        for line in format_progress_details(progress) {
            println!("  {line}");
        }
    }

    if let Some(size) = &snapshot.human_size_label {
        println!("  {} {}", "Update size:".dimmed(), size);
    }

    if snapshot.phase.is_active() {
        println!(
            "  {}",
            "Update in progress; use `status --watch` to follow it".dimmed()
        );
    }

    let _ = io::stdout().flush();
}

/// Print a snapshot as a single JSON line.
///
/// # Errors
///
/// Returns an error if the snapshot cannot be serialized.
pub fn print_snapshot_json(snapshot: &UpdateSnapshot) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string(snapshot)?);
    let _ = io::stdout().flush();
    Ok(())
}

/// Print an informational message.
pub fn print_info(message: &str) {
    println!("{} {}", "[INFO]".cyan().bold(), message);
    let _ = io::stdout().flush();
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", "[ERROR]".red().bold(), message);
}
