//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::inference::InferenceThresholds;
use crate::ipc::DEFAULT_SOCKET_PATH;
use crate::source::DEFAULT_LOG_PATH;
use crate::store::default_store_path;
use crate::trigger::{DEFAULT_OPENER, DEFAULT_SETTINGS_URL};

/// Top-level configuration loaded from TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Inference window sizes.
    pub inference: InferenceThresholds,
    /// Log acquisition settings.
    pub log: LogConfig,
    /// Snapshot store settings.
    pub store: StoreConfig,
    /// IPC settings.
    pub ipc: IpcConfig,
    /// Update check trigger settings.
    pub trigger: TriggerConfig,
}

/// Log acquisition settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log file read when no file is given on the command line.
    pub path: PathBuf,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_LOG_PATH),
        }
    }
}

/// Snapshot store settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Database file.
    pub path: PathBuf,
    /// Age after which a stored status is reset to idle on startup.
    pub stale_after_secs: u64,
}

impl StoreConfig {
    /// Staleness threshold as a [`Duration`].
    #[must_use]
    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            stale_after_secs: 3600,
        }
    }
}

/// IPC settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IpcConfig {
    /// Unix socket the monitor listens on.
    pub socket_path: PathBuf,
    /// Client timeout in milliseconds.
    pub timeout_ms: u64,
}

impl IpcConfig {
    /// Client timeout as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for IpcConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
            timeout_ms: 4000,
        }
    }
}

/// Update check trigger settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// Program that opens the settings URL.
    pub opener: String,
    /// Settings page that starts an update check.
    pub settings_url: String,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            opener: DEFAULT_OPENER.to_string(),
            settings_url: DEFAULT_SETTINGS_URL.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitor_config_defaults() {
        let config = MonitorConfig::default();
        assert_eq!(config.inference.window_size, 100);
        assert_eq!(config.inference.phase_window_size, 50);
        assert_eq!(config.log.path, PathBuf::from("/var/log/update_engine.log"));
        assert_eq!(config.store.stale_after(), Duration::from_secs(3600));
        assert!(config.store.path.ends_with("update-monitor/status.db"));
        assert_eq!(config.ipc.socket_path, PathBuf::from("/tmp/update-monitor.sock"));
        assert_eq!(config.ipc.timeout(), Duration::from_secs(4));
        assert_eq!(config.trigger.opener, "xdg-open");
        assert_eq!(config.trigger.settings_url, "chrome://os-settings/about");
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let toml = r"
            [inference]
            phase_window_size = 20
        ";
        let config: MonitorConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.inference.window_size, 100);
        assert_eq!(config.inference.phase_window_size, 20);
        assert_eq!(config.ipc, IpcConfig::default());
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config: MonitorConfig = toml::from_str("").unwrap();
        assert_eq!(config, MonitorConfig::default());
    }
}
