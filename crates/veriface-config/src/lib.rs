use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use self::capture::CaptureConfig;
use self::network::NetworkConfig;

pub mod capture;
pub mod network;

fn default_auto_send_interval_ms() -> u64 {
    5000
}

fn default_log_filter() -> String {
    "info".to_string()
}

/// Startup configuration. Read-only once the session is running.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub network: NetworkConfig,
    pub capture: CaptureConfig,

    /// Initial value of the operator's auto-send toggle
    pub auto_send: bool,
    /// Auto-trigger period
    #[serde(default = "default_auto_send_interval_ms")]
    pub auto_send_interval_ms: u64,
    /// tracing filter used when RUST_LOG is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            capture: CaptureConfig::default(),
            auto_send: false,
            auto_send_interval_ms: default_auto_send_interval_ms(),
            log_filter: default_log_filter(),
        }
    }
}

impl Config {
    /// Build from environment variables, falling back to defaults
    pub fn new() -> Self {
        let auto_send = env_or("VERIFACE_AUTO_SEND", false);

        let auto_send_interval_ms =
            env_or("AUTO_SEND_INTERVAL_MS", default_auto_send_interval_ms()).max(1); // 5 seconds default

        let log_filter = env::var("LOG_FILTER").unwrap_or_else(|_| default_log_filter());

        Config {
            network: NetworkConfig::new(),
            capture: CaptureConfig::new(),

            auto_send,
            auto_send_interval_ms,
            log_filter,
        }
    }

    /// Load a JSON config file. Missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let reader = BufReader::new(file);
        let config = serde_json::from_reader(reader)?;
        Ok(config)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

pub(crate) fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
