//! IPC between the update monitor and its clients.
//!
//! A running monitor (`update-monitor serve`) owns the snapshot store and
//! answers requests from popups, scripts or other CLI invocations.
//!
//! # Architecture
//!
//! ```text
//! Client                         Monitor
//!   |                               |
//!   |-- UpdateRequest ------------->|
//!   |                               | (infer / load / trigger)
//!   |<-- UpdateResponse ------------|
//!   |                               |
//! ```
//!
//! # Protocol
//!
//! Communication uses JSON-line format over Unix domain sockets:
//! - Client sends JSON + newline
//! - Server responds with JSON + newline
//!
//! # Example
//!
//! ```no_run
//! use update_monitor::ipc::{IpcClient, UpdateRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = IpcClient::new();
//!
//! if client.is_server_running() {
//!     let response = client.send(&UpdateRequest::GetUpdateStatus).await?;
//!     println!("Current status: {:?}", response.status);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod server;
pub mod types;

pub use client::IpcClient;
pub use server::{IpcServer, ServerHandle};
pub use types::{IpcError, UpdateRequest, UpdateResponse};

/// Default socket path for the update monitor.
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/update-monitor.sock";
