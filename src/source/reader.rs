//! One-shot log readers.

use std::path::Path;

use tokio::io::AsyncReadExt;

use super::error::SourceError;

/// Split raw log text into lines, dropping blank ones.
///
/// Lines keep their content as written apart from a trailing `\r`.
#[must_use]
pub fn lines_from_text(text: &str) -> Vec<String> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
        .map(String::from)
        .collect()
}

/// Read a whole log file and split it into lines.
///
/// Invalid UTF-8 is replaced rather than rejected.
///
/// # Errors
///
/// Returns an error if:
/// - The file does not exist ([`SourceError::NotFound`])
/// - The file cannot be read due to permissions ([`SourceError::PermissionDenied`])
/// - Any other I/O error occurs
pub async fn read_log_file(path: impl AsRef<Path>) -> Result<Vec<String>, SourceError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| SourceError::from_io(path.to_path_buf(), e))?;

    let text = decode(bytes, &path.display().to_string());
    let lines = lines_from_text(&text);

    tracing::debug!(path = %path.display(), lines = lines.len(), "Read log file");
    Ok(lines)
}

/// Read all of standard input and split it into lines.
///
/// # Errors
///
/// Returns an error if reading standard input fails.
pub async fn read_stdin() -> Result<Vec<String>, SourceError> {
    let mut bytes = Vec::new();
    tokio::io::stdin().read_to_end(&mut bytes).await?;

    let text = decode(bytes, "<stdin>");
    Ok(lines_from_text(&text))
}

fn decode(bytes: Vec<u8>, origin: &str) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(origin = %origin, "Log contains invalid UTF-8, replacing bad bytes");
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    }
}
