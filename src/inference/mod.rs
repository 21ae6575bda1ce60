//! Update status inference from update_engine logs.
//!
//! Line classifiers extract progress records and error messages from single
//! lines; the inference engine combines them over a bounded window into one
//! [`UpdateSnapshot`].

mod classify;
mod engine;
mod format;
mod types;

pub use classify::{parse_error_line, parse_progress_line};
pub use engine::{infer, InferenceThresholds, LogInference};
pub use format::format_bytes;
pub use types::{Phase, ProgressRecord, UpdateSnapshot};
