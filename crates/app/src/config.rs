//! Service configuration
//!
//! Loaded from a TOML file (path via `MUSTER_CONFIG`, default
//! `muster.toml`); a missing file just means defaults. A few env overrides
//! cover containerized deployments where editing files is awkward.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Port platform adapters connect to
    pub gateway_port: u16,
    /// Port of the liveness endpoint
    pub status_port: u16,
    /// Delay before a still-empty party is closed
    pub auto_close_secs: u64,
    /// Delay before a handled command message is deleted
    pub command_delete_secs: u64,
    pub keepalive: Option<KeepaliveConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeepaliveConfig {
    /// External URL to ping so the host does not idle the process out
    pub url: String,
    #[serde(default = "default_keepalive_interval")]
    pub interval_secs: u64,
}

fn default_keepalive_interval() -> u64 {
    14 * 60
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gateway_port: 7420,
            status_port: 8000,
            auto_close_secs: 300,
            command_delete_secs: 3,
            keepalive: None,
        }
    }
}

impl Config {
    /// Load from the configured path, falling back to defaults when the file
    /// does not exist, then apply env overrides
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("MUSTER_CONFIG").unwrap_or_else(|_| "muster.toml".to_string());
        let mut config = Self::load_from(Path::new(&path))?;
        config.apply_env();
        Ok(config)
    }

    fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    fn apply_env(&mut self) {
        if let Some(port) = env_parse("MUSTER_GATEWAY_PORT") {
            self.gateway_port = port;
        }
        if let Some(port) = env_parse("MUSTER_STATUS_PORT") {
            self.status_port = port;
        }
        if let Ok(url) = std::env::var("MUSTER_KEEPALIVE_URL") {
            if !url.is_empty() {
                let interval_secs = self
                    .keepalive
                    .as_ref()
                    .map(|k| k.interval_secs)
                    .unwrap_or_else(default_keepalive_interval);
                self.keepalive = Some(KeepaliveConfig { url, interval_secs });
            }
        }
    }

    pub fn auto_close_delay(&self) -> Duration {
        Duration::from_secs(self.auto_close_secs)
    }

    pub fn command_delete_delay(&self) -> Duration {
        Duration::from_secs(self.command_delete_secs)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.gateway_port, 7420);
        assert_eq!(config.status_port, 8000);
        assert_eq!(config.auto_close_delay(), Duration::from_secs(300));
        assert!(config.keepalive.is_none());
    }

    #[test]
    fn test_missing_file_means_defaults() {
        let config = Config::load_from(Path::new("/nonexistent/muster.toml")).unwrap();
        assert_eq!(config.gateway_port, Config::default().gateway_port);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
gateway_port = 9100
auto_close_secs = 60

[keepalive]
url = "https://example.invalid/health"
"#
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.gateway_port, 9100);
        assert_eq!(config.auto_close_secs, 60);
        // Unspecified fields keep their defaults
        assert_eq!(config.status_port, 8000);

        let keepalive = config.keepalive.unwrap();
        assert_eq!(keepalive.url, "https://example.invalid/health");
        assert_eq!(keepalive.interval_secs, 14 * 60);
    }

    #[test]
    fn test_invalid_file_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "gateway_port = \"not a port\"").unwrap();
        assert!(matches!(
            Config::load_from(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }
}
