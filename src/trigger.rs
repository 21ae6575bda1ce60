//! Update check trigger.
//!
//! Opens the system settings page that starts an update check by handing
//! its URL to an opener program.

use std::process::Stdio;

use tokio::process::Command;
use url::Url;

/// Default program used to open the settings URL.
pub const DEFAULT_OPENER: &str = "xdg-open";

/// Settings page that starts an update check.
pub const DEFAULT_SETTINGS_URL: &str = "chrome://os-settings/about";

/// Error type for update check triggering.
#[derive(thiserror::Error, Debug)]
pub enum TriggerError {
    /// The configured settings URL is not a valid URL.
    #[error("Invalid settings URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    /// The opener binary was not found.
    #[error("Opener not found: {0}")]
    OpenerNotFound(String),
    /// Permission denied when spawning the opener.
    #[error("Permission denied running {0}")]
    PermissionDenied(String),
    /// The opener exited unsuccessfully.
    #[error("Opener exited with status {0}")]
    OpenerFailed(i32),
    /// Other I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TriggerError {
    /// Create a `TriggerError` from a spawn failure, classifying common cases.
    fn from_spawn(opener: &str, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::OpenerNotFound(opener.to_string()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(opener.to_string()),
            _ => Self::Io(err),
        }
    }
}

/// Starts an update check by opening the settings page.
#[derive(Debug, Clone)]
pub struct UpdateTrigger {
    opener: String,
    settings_url: Url,
}

impl UpdateTrigger {
    /// Create a trigger for the given opener program and settings URL.
    ///
    /// # Errors
    ///
    /// Returns [`TriggerError::InvalidUrl`] if `settings_url` does not parse.
    pub fn new(opener: impl Into<String>, settings_url: &str) -> Result<Self, TriggerError> {
        let settings_url = Url::parse(settings_url).map_err(|source| TriggerError::InvalidUrl {
            url: settings_url.to_string(),
            source,
        })?;
        Ok(Self {
            opener: opener.into(),
            settings_url,
        })
    }

    /// Get the opener program.
    #[must_use]
    pub fn opener(&self) -> &str {
        &self.opener
    }

    /// Get the settings URL.
    #[must_use]
    pub fn settings_url(&self) -> &Url {
        &self.settings_url
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.opener);
        cmd.arg(self.settings_url.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        cmd
    }

    /// Run the opener with the settings URL and wait for it to exit.
    ///
    /// # Errors
    ///
    /// Returns an error if the opener cannot be spawned or exits unsuccessfully.
    pub async fn trigger(&self) -> Result<(), TriggerError> {
        tracing::debug!(
            opener = %self.opener,
            url = %self.settings_url,
            "Opening settings page"
        );

        let status = self
            .command()
            .status()
            .await
            .map_err(|e| TriggerError::from_spawn(&self.opener, e))?;

        if status.success() {
            Ok(())
        } else {
            Err(TriggerError::OpenerFailed(status.code().unwrap_or(-1)))
        }
    }

    /// Spawn the opener and return without waiting for it.
    ///
    /// The exit status is collected in a background task and only logged.
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the opener cannot be spawned.
    pub fn launch(&self) -> Result<(), TriggerError> {
        tracing::debug!(
            opener = %self.opener,
            url = %self.settings_url,
            "Launching settings page"
        );

        let mut child = self
            .command()
            .spawn()
            .map_err(|e| TriggerError::from_spawn(&self.opener, e))?;
        let opener = self.opener.clone();

        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) if status.success() => {
                    tracing::debug!(opener = %opener, "Opener exited");
                }
                Ok(status) => {
                    let err = TriggerError::OpenerFailed(status.code().unwrap_or(-1));
                    tracing::warn!(opener = %opener, error = %err, "Opener failed");
                }
                Err(e) => {
                    tracing::warn!(opener = %opener, error = %e, "Failed to wait for opener");
                }
            }
        });

        Ok(())
    }
}
