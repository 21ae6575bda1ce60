//! Monitor commands.
//!
//! Each `update-monitor` subcommand maps to one method on [`Monitor`]. When a
//! monitor server is running, status queries and update checks go through
//! its socket; otherwise the command talks to the store or the opener
//! directly.

use std::path::PathBuf;
use std::time::Duration;

use crate::config::{ConfigError, MonitorConfig};
use crate::inference::{LogInference, UpdateSnapshot};
use crate::ipc::{IpcClient, IpcError, IpcServer, UpdateRequest, UpdateResponse};
use crate::service::UpdateService;
use crate::source::{read_log_file, read_stdin, SourceError};
use crate::store::{SnapshotStore, StoreError};
use crate::trigger::{TriggerError, UpdateTrigger};

/// Default polling period for [`Monitor::watch`].
pub const DEFAULT_WATCH_INTERVAL: Duration = Duration::from_secs(5);

/// Shortest polling period [`Monitor::watch`] accepts.
const MIN_WATCH_INTERVAL: Duration = Duration::from_millis(10);

/// Errors that can occur while running a command.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Ipc(#[from] IpcError),
    #[error(transparent)]
    Trigger(#[from] TriggerError),
    /// The monitor answered with `success: false`.
    #[error("Monitor rejected request: {0}")]
    Rejected(String),
    #[error("Failed to wait for shutdown signal: {0}")]
    Signal(std::io::Error),
}

/// Where `parse` reads its log lines from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogInput {
    Stdin,
    File(PathBuf),
}

impl LogInput {
    /// Interpret a command-line argument: `-` is stdin, anything else a file.
    #[must_use]
    pub fn from_arg(arg: Option<PathBuf>, default_path: PathBuf) -> Self {
        match arg {
            Some(path) if path.as_os_str() == "-" => Self::Stdin,
            Some(path) => Self::File(path),
            None => Self::File(default_path),
        }
    }
}

/// Where a status answer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusSource {
    /// A running monitor answered over IPC.
    Server,
    /// Read straight from the snapshot store.
    Store,
}

/// Runs monitor commands against one configuration.
#[derive(Debug, Clone)]
pub struct Monitor {
    config: MonitorConfig,
}

impl Monitor {
    #[must_use]
    pub fn new(config: MonitorConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Client for the configured socket.
    #[must_use]
    pub fn client(&self) -> IpcClient {
        IpcClient::with_path(&self.config.ipc.socket_path).with_timeout(self.config.ipc.timeout())
    }

    /// Build the trigger from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured settings URL is invalid.
    pub fn trigger(&self) -> Result<UpdateTrigger, TriggerError> {
        UpdateTrigger::new(
            self.config.trigger.opener.clone(),
            &self.config.trigger.settings_url,
        )
    }

    /// Open the configured snapshot store.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub async fn open_store(&self) -> Result<SnapshotStore, StoreError> {
        SnapshotStore::open(&self.config.store.path).await
    }

    /// Build a service over the configured store and trigger.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened or the trigger is invalid.
    pub async fn open_service(&self) -> Result<UpdateService, CommandError> {
        let store = self.open_store().await?;
        let trigger = self.trigger()?;
        Ok(UpdateService::new(store, trigger).with_thresholds(self.config.inference))
    }

    /// Infer a snapshot from a batch of log lines, saving it unless `save` is false.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be read or the snapshot cannot be saved.
    pub async fn parse(&self, input: &LogInput, save: bool) -> Result<UpdateSnapshot, CommandError> {
        let lines = match input {
            LogInput::Stdin => read_stdin().await?,
            LogInput::File(path) => read_log_file(path).await?,
        };

        let snapshot = LogInference::with_thresholds(self.config.inference).infer(&lines);
        tracing::info!(lines = lines.len(), phase = %snapshot.phase, "Parsed log input");

        if save {
            self.open_store().await?.save(&snapshot).await?;
        }

        Ok(snapshot)
    }

    /// Current status, from a running monitor if there is one.
    ///
    /// # Errors
    ///
    /// Returns an error if the monitor or the store cannot be reached.
    pub async fn status(&self) -> Result<(UpdateSnapshot, StatusSource), CommandError> {
        let client = self.client();
        if client.is_server_running() {
            match client.send(&UpdateRequest::GetUpdateStatus).await {
                Ok(response) => return Ok((into_snapshot(response)?, StatusSource::Server)),
                Err(e) => {
                    tracing::warn!(error = %e, "Monitor unreachable, reading store directly");
                }
            }
        }

        let store = self.open_store().await?;
        store.reset_if_stale(self.config.store.stale_after()).await?;
        Ok((store.load_or_default().await?, StatusSource::Store))
    }

    /// Poll the status every `period` while an update is in progress.
    ///
    /// `on_status` sees every polled snapshot. Returns the first snapshot
    /// whose phase is no longer active.
    ///
    /// # Errors
    ///
    /// Returns an error if a poll fails.
    pub async fn watch<F>(
        &self,
        period: Duration,
        mut on_status: F,
    ) -> Result<UpdateSnapshot, CommandError>
    where
        F: FnMut(&UpdateSnapshot, StatusSource),
    {
        let mut ticker = tokio::time::interval(period.max(MIN_WATCH_INTERVAL));

        loop {
            ticker.tick().await;
            let (snapshot, source) = self.status().await?;
            on_status(&snapshot, source);

            if !snapshot.phase.is_active() {
                tracing::debug!(phase = %snapshot.phase, "Update no longer active, stopping watch");
                return Ok(snapshot);
            }
        }
    }

    /// Ask for an update check.
    ///
    /// # Errors
    ///
    /// Returns an error if the monitor rejects the request or the opener fails.
    pub async fn check(&self) -> Result<(), CommandError> {
        let client = self.client();
        if client.is_server_running() {
            match client.send(&UpdateRequest::CheckForUpdates).await {
                Ok(response) => return expect_success(response),
                Err(IpcError::ConnectionFailed(e)) => {
                    tracing::warn!(error = %e, "Monitor unreachable, opening settings directly");
                }
                Err(e) => return Err(e.into()),
            }
        }

        self.trigger()?.trigger().await?;
        Ok(())
    }

    /// Run the monitor server until Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns an error if the store, trigger or socket cannot be set up.
    pub async fn serve(&self) -> Result<(), CommandError> {
        let service = self.open_service().await?;
        service.initialize(self.config.store.stale_after()).await?;

        let server = IpcServer::new(&self.config.ipc.socket_path);
        let handle = server.start(move |request| {
            let service = service.clone();
            async move { service.handle(request).await }
        })?;

        tracing::info!(socket = %handle.socket_path().display(), "Update monitor running");

        tokio::signal::ctrl_c().await.map_err(CommandError::Signal)?;

        tracing::info!("Shutdown signal received");
        handle.shutdown();
        Ok(())
    }

    /// Remove the stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened or written.
    pub async fn reset(&self) -> Result<(), CommandError> {
        self.open_store().await?.clear().await?;
        Ok(())
    }
}

fn expect_success(response: UpdateResponse) -> Result<(), CommandError> {
    if response.success {
        Ok(())
    } else {
        Err(CommandError::Rejected(
            response.error.unwrap_or_else(|| "unknown error".to_string()),
        ))
    }
}

fn into_snapshot(response: UpdateResponse) -> Result<UpdateSnapshot, CommandError> {
    if !response.success {
        return Err(CommandError::Rejected(
            response.error.unwrap_or_else(|| "unknown error".to_string()),
        ));
    }
    response.status.ok_or(CommandError::Ipc(IpcError::InvalidResponse))
}
