//! Application configuration for the action bridge server.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::history::{HistoryFiles, MAX_HISTORY_ENTRIES};

/// Application configuration loaded from environment variables.
///
/// Environment variables are prefixed with `ACTION_BRIDGE_`:
/// - `ACTION_BRIDGE_HOST`: Listen address (default: "127.0.0.1")
/// - `ACTION_BRIDGE_PORT`: Listen port (default: 63343)
/// - `ACTION_BRIDGE_PERSIST_INTERVAL_SECS`: History snapshot period (default: 30)
/// - `ACTION_BRIDGE_DATA_DIR`: Directory for `history.json` / `stats.json`
///   (default: `~/.intellij-actions`)
/// - `ACTION_BRIDGE_HOST_PROFILE`: YAML host profile to serve (optional)
/// - `ACTION_BRIDGE_MAX_HISTORY`: History log capacity (default: 1000)
/// - `ACTION_BRIDGE_BLOCKING_THREADS`: Request worker pool size (optional)
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Listen address
    #[serde(default = "default_host")]
    pub host: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Seconds between history snapshots
    #[serde(default = "default_persist_interval")]
    pub persist_interval_secs: u64,

    /// Persistence directory override
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Host profile to load instead of an empty host
    #[serde(default)]
    pub host_profile: Option<PathBuf>,

    /// Maximum number of history entries kept
    #[serde(default = "default_max_history")]
    pub max_history: usize,

    /// Cap for the blocking pool that runs engine calls
    #[serde(default)]
    pub blocking_threads: Option<usize>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    63343
}

fn default_persist_interval() -> u64 {
    30
}

fn default_max_history() -> usize {
    MAX_HISTORY_ENTRIES
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables are prefixed with `ACTION_BRIDGE_`.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed("ACTION_BRIDGE_").from_env::<AppConfig>()
    }

    /// Get the server bind address as a string suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn persist_interval(&self) -> Duration {
        Duration::from_secs(self.persist_interval_secs.max(1))
    }

    /// Where history snapshots live, if anywhere.
    pub fn history_files(&self) -> Option<HistoryFiles> {
        match &self.data_dir {
            Some(dir) => Some(HistoryFiles::in_dir(dir)),
            None => HistoryFiles::default_location(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            persist_interval_secs: default_persist_interval(),
            data_dir: None,
            host_profile: None,
            max_history: default_max_history(),
            blocking_threads: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 63343);
        assert_eq!(config.max_history, 1000);
        assert_eq!(config.persist_interval(), Duration::from_secs(30));
    }

    #[test]
    fn test_bind_address() {
        let config = AppConfig::default();
        assert_eq!(config.bind_address(), "127.0.0.1:63343");
    }

    #[test]
    fn test_from_iter_matches_defaults() {
        let config: AppConfig = envy::prefixed("ACTION_BRIDGE_")
            .from_iter(vec![
                ("ACTION_BRIDGE_PORT".to_string(), "8099".to_string()),
                ("ACTION_BRIDGE_DATA_DIR".to_string(), "/tmp/bridge".to_string()),
            ])
            .unwrap();
        assert_eq!(config.port, 8099);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(
            config.history_files().unwrap().history,
            PathBuf::from("/tmp/bridge/history.json")
        );
    }
}
