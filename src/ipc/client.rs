//! IPC client for talking to a running update monitor.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

use crate::ipc::{IpcError, UpdateRequest, UpdateResponse, DEFAULT_SOCKET_PATH};

/// Default timeout for IPC operations (4 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(4);

/// IPC client that sends [`UpdateRequest`]s over the monitor's Unix socket.
#[derive(Debug, Clone)]
pub struct IpcClient {
    socket_path: PathBuf,
    timeout: Duration,
}

impl IpcClient {
    /// Creates a new IPC client with the default socket path.
    #[must_use]
    pub fn new() -> Self {
        Self::with_path(DEFAULT_SOCKET_PATH)
    }

    /// Creates a new IPC client with a custom socket path.
    #[must_use]
    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            socket_path: path.as_ref().to_path_buf(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the timeout duration for IPC operations.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the socket path.
    #[must_use]
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Returns the timeout duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Checks if the monitor is running by verifying the socket file exists.
    #[must_use]
    pub fn is_server_running(&self) -> bool {
        self.socket_path.exists()
    }

    /// Sends a request to the monitor and waits for the response.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The monitor is not running ([`IpcError::ServerNotRunning`])
    /// - The connection fails ([`IpcError::ConnectionFailed`])
    /// - The operation times out ([`IpcError::Timeout`])
    /// - Message serialization fails ([`IpcError::SerializationError`])
    /// - The response is empty ([`IpcError::InvalidResponse`])
    pub async fn send(&self, request: &UpdateRequest) -> Result<UpdateResponse, IpcError> {
        if !self.is_server_running() {
            return Err(IpcError::ServerNotRunning);
        }

        #[allow(clippy::cast_possible_truncation)]
        let timeout_ms = self.timeout.as_millis() as u64;

        let result = tokio::time::timeout(self.timeout, async {
            let stream = UnixStream::connect(&self.socket_path).await?;
            let (reader, mut writer) = stream.into_split();

            let mut request_json = serde_json::to_string(request)?;
            request_json.push('\n');
            writer.write_all(request_json.as_bytes()).await?;
            writer.flush().await?;

            let mut reader = BufReader::new(reader);
            let mut response_line = String::new();
            let bytes_read = reader.read_line(&mut response_line).await?;

            if bytes_read == 0 {
                return Err(IpcError::InvalidResponse);
            }

            let response: UpdateResponse = serde_json::from_str(response_line.trim())?;
            Ok(response)
        })
        .await;

        match result {
            Ok(inner) => inner,
            Err(_) => Err(IpcError::Timeout(timeout_ms)),
        }
    }
}

impl Default for IpcClient {
    fn default() -> Self {
        Self::new()
    }
}
