//! End-to-end inference over realistic log excerpts.

use update_monitor::inference::{infer, InferenceThresholds, LogInference, Phase};
use update_monitor::source::{lines_from_text, read_log_file};

const DOWNLOAD_LOG: &str = "\
[0101/120000.000001:INFO:update_attempter.cc(100)] Periodic check started\r
[0101/120001.000001:INFO:omaha_request_action.cc(200)] Checking for update\r
[0101/120010.000001:INFO:delta_performer.cc(300)] Completed 5/100 operations (5%), 10485760/209715200 bytes downloaded (5%), overall progress 5%\r
\r
[0101/120020.000001:INFO:delta_performer.cc(300)] Completed 40/100 operations (40%), 83886080/209715200 bytes downloaded (40%), overall progress 40%\r
";

const FAILED_LOG: &str = "\
[0101/120000.000001:INFO:update_attempter.cc(100)] update attempt 3\n\
[0101/120005.000001:ERROR update_engine: download_action.cc(42)] Download failed: error 2000\n\
[0101/120006.000001:INFO:metrics.cc(12)] Error counter: 3\n";

#[test]
fn download_in_progress() {
    let snapshot = infer(&lines_from_text(DOWNLOAD_LOG));

    assert_eq!(snapshot.phase, Phase::Downloading);
    let progress = snapshot.progress.expect("progress found");
    assert_eq!(progress.percent, 40);
    assert_eq!(progress.operations_completed, 40);
    assert_eq!(progress.operations_total, 100);
    assert_eq!(progress.bytes_downloaded, 83_886_080);
    assert_eq!(progress.bytes_total, 209_715_200);
    assert_eq!(snapshot.human_size_label.as_deref(), Some("200.00 MB"));
    assert!(snapshot.error_message.is_none());
}

#[test]
fn failed_download_reports_error() {
    let snapshot = infer(&lines_from_text(FAILED_LOG));

    assert_eq!(snapshot.phase, Phase::Error);
    assert_eq!(
        snapshot.error_message.as_deref(),
        Some("Download failed: error 2000")
    );
    assert!(snapshot.progress.is_none());
}

#[test]
fn old_lines_fall_out_of_the_window() {
    let mut lines = vec!["ERROR update_engine: [a.cc(1)] Ancient failure".to_string()];
    lines.extend((0..100).map(|i| format!("filler line {i}")));

    let snapshot = infer(&lines);
    assert_eq!(snapshot.phase, Phase::Idle);
    assert!(snapshot.error_message.is_none());
}

#[test]
fn configured_windows_narrow_phase_detection() {
    let mut lines = vec!["Checking for update".to_string()];
    lines.extend((0..5).map(|i| format!("filler line {i}")));

    let wide = infer(&lines);
    assert_eq!(wide.phase, Phase::Checking);

    let narrow = LogInference::with_thresholds(InferenceThresholds {
        window_size: 100,
        phase_window_size: 3,
    })
    .infer(&lines);
    assert_eq!(narrow.phase, Phase::Idle);
}

#[tokio::test]
async fn inference_from_log_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("update_engine.log");
    std::fs::write(&path, FAILED_LOG).unwrap();

    let lines = read_log_file(&path).await.unwrap();
    assert_eq!(lines.len(), 3);
    assert_eq!(infer(&lines).phase, Phase::Error);
}
