//! Host application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Persisted configuration for the sharing host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// Signaling relay endpoint (e.g. "wss://relay.example.com").
    pub server_host: String,

    /// Display name reported to the relay for this machine.
    pub machine_name: String,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "sharecast=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            server_host: String::new(),
            machine_name: default_machine_name(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl HostConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }

    /// Server host with a scheme prepended when the stored value has none.
    /// Relay endpoints entered by hand usually omit it.
    pub fn normalized_host(&self) -> String {
        normalize_host(&self.server_host)
    }
}

/// Prepend "wss://" to a bare relay hostname; pass through values that
/// already carry a websocket or http scheme.
pub fn normalize_host(host: &str) -> String {
    let trimmed = host.trim().trim_end_matches('/');
    if trimmed.starts_with("wss://")
        || trimmed.starts_with("ws://")
        || trimmed.starts_with("https://")
        || trimmed.starts_with("http://")
    {
        trimmed.to_string()
    } else {
        format!("wss://{trimmed}")
    }
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("sharecast").join("config.json")
}

/// Machine name reported to the relay, from the environment when available.
fn default_machine_name() -> String {
    std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .unwrap_or_else(|_| "sharecast-host".to_string())
}
