//! CLI command implementations.

pub mod monitor;

pub use monitor::{CommandError, LogInput, Monitor, StatusSource, DEFAULT_WATCH_INTERVAL};
