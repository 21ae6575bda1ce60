//! Log text acquisition.
//!
//! Turns pasted text, piped input or a log file into the ordered line batch
//! consumed by the inference engine. Reads are one-shot; nothing here
//! follows a growing file.

mod error;
mod reader;

pub use error::SourceError;
pub use reader::{lines_from_text, read_log_file, read_stdin};

/// Default location of the update engine log.
pub const DEFAULT_LOG_PATH: &str = "/var/log/update_engine.log";
