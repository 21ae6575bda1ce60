//! IPC server for the update monitor.
//!
//! Listens on a Unix domain socket and answers one JSON-line request per
//! connection.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;
use tokio::sync::watch;

use crate::ipc::{IpcError, UpdateRequest, UpdateResponse, DEFAULT_SOCKET_PATH};

/// IPC server for receiving update requests.
///
/// The server listens on a Unix domain socket and spawns a handler
/// for each incoming connection.
#[derive(Debug)]
pub struct IpcServer {
    socket_path: PathBuf,
}

impl IpcServer {
    /// Creates a new IPC server with a custom socket path.
    #[must_use]
    pub fn new<P: AsRef<Path>>(socket_path: P) -> Self {
        Self {
            socket_path: socket_path.as_ref().to_path_buf(),
        }
    }

    /// Creates a new IPC server with the default socket path.
    #[must_use]
    pub fn with_default_path() -> Self {
        Self::new(DEFAULT_SOCKET_PATH)
    }

    /// Returns the socket path.
    #[must_use]
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Starts the IPC server with the given request handler.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the socket.
    pub fn start<F, Fut>(&self, handler: F) -> Result<ServerHandle, IpcError>
    where
        F: Fn(UpdateRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = UpdateResponse> + Send,
    {
        // Stale socket from a previous run
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path)?;
        }

        let listener = UnixListener::bind(&self.socket_path)?;
        tracing::info!(path = %self.socket_path.display(), "IPC server started");

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let handler = Arc::new(handler);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;

                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::info!("IPC server shutting down");
                            break;
                        }
                    }

                    accept_result = listener.accept() => {
                        match accept_result {
                            Ok((stream, _addr)) => {
                                let handler = Arc::clone(&handler);
                                tokio::spawn(async move {
                                    if let Err(e) = handle_connection(stream, handler).await {
                                        tracing::warn!(error = %e, "Connection handler error");
                                    }
                                });
                            }
                            Err(e) => {
                                tracing::warn!(error = %e, "Failed to accept connection");
                            }
                        }
                    }
                }
            }
        });

        Ok(ServerHandle {
            socket_path: self.socket_path.clone(),
            shutdown_tx,
        })
    }
}

/// Handle for a running IPC server.
///
/// When dropped, the socket file is cleaned up.
#[derive(Debug)]
pub struct ServerHandle {
    socket_path: PathBuf,
    shutdown_tx: watch::Sender<bool>,
}

impl ServerHandle {
    /// Signals the server to shut down.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Returns the socket path.
    #[must_use]
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);

        if self.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.socket_path) {
                tracing::warn!(
                    path = %self.socket_path.display(),
                    error = %e,
                    "Failed to remove socket file"
                );
            }
        }
    }
}

/// Handles a single connection: one request line in, one response line out.
async fn handle_connection<F, Fut>(
    stream: tokio::net::UnixStream,
    handler: Arc<F>,
) -> Result<(), IpcError>
where
    F: Fn(UpdateRequest) -> Fut + Send + Sync,
    Fut: Future<Output = UpdateResponse> + Send,
{
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    let bytes_read = reader.read_line(&mut line).await?;
    if bytes_read == 0 {
        return Ok(());
    }

    let response = match serde_json::from_str::<UpdateRequest>(line.trim()) {
        Ok(request) => {
            tracing::debug!(kind = request.kind(), "Received update request");
            handler(request).await
        }
        Err(e) => {
            tracing::warn!(error = %e, "Unknown or malformed request");
            UpdateResponse::failure("Unknown message type")
        }
    };

    let mut response_json = serde_json::to_string(&response)?;
    response_json.push('\n');
    writer.write_all(response_json.as_bytes()).await?;
    writer.flush().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::UnixStream;

    use crate::inference::UpdateSnapshot;

    #[test]
    fn server_new_uses_custom_path() {
        let server = IpcServer::new("/custom/path.sock");
        assert_eq!(server.socket_path(), Path::new("/custom/path.sock"));
    }

    #[test]
    fn server_with_default_path_uses_default() {
        let server = IpcServer::with_default_path();
        assert_eq!(server.socket_path(), Path::new(DEFAULT_SOCKET_PATH));
    }

    #[tokio::test]
    async fn server_client_integration() {
        use crate::ipc::IpcClient;

        let temp_dir = tempfile::tempdir().unwrap();
        let socket_path = temp_dir.path().join("monitor.sock");

        let server = IpcServer::new(&socket_path);
        let handle = server
            .start(|req| async move {
                match req {
                    UpdateRequest::GetUpdateStatus => UpdateResponse::ok(UpdateSnapshot::initial()),
                    _ => UpdateResponse::ack(),
                }
            })
            .expect("Failed to start server");

        tokio::time::sleep(Duration::from_millis(10)).await;

        let client = IpcClient::with_path(&socket_path);
        assert!(client.is_server_running());

        let response = client
            .send(&UpdateRequest::GetUpdateStatus)
            .await
            .expect("Request failed");
        assert!(response.success);
        assert!(response.status.is_some());

        let response = client
            .send(&UpdateRequest::CheckForUpdates)
            .await
            .expect("Request failed");
        assert_eq!(response, UpdateResponse::ack());

        handle.shutdown();
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    #[tokio::test]
    async fn server_rejects_unknown_message_type() {
        let temp_dir = tempfile::tempdir().unwrap();
        let socket_path = temp_dir.path().join("unknown.sock");

        let _handle = IpcServer::new(&socket_path)
            .start(|_| async { UpdateResponse::ack() })
            .expect("Failed to start server");
        tokio::time::sleep(Duration::from_millis(10)).await;

        let mut stream = UnixStream::connect(&socket_path).await.unwrap();
        stream.write_all(b"{\"type\":\"REBOOT\"}\n").await.unwrap();

        let mut raw = String::new();
        stream.read_to_string(&mut raw).await.unwrap();
        let response: UpdateResponse = serde_json::from_str(raw.trim()).unwrap();

        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("Unknown message type"));
    }

    #[tokio::test]
    async fn server_handle_drop_cleans_up_socket() {
        let temp_dir = tempfile::tempdir().unwrap();
        let socket_path = temp_dir.path().join("drop.sock");

        {
            let _handle = IpcServer::new(&socket_path)
                .start(|_| async { UpdateResponse::ack() })
                .expect("Failed to start server");
            assert!(socket_path.exists());
        }

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!socket_path.exists());
    }
}
