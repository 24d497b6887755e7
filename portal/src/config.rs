//! Portal configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use voto_client::HttpTimeouts;
use voto_tally::SyncConfig;
use voto_utils::LogFormat;

use crate::PortalError;

/// Configuration for a portal instance.
///
/// Can be loaded from a TOML file via [`PortalConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PortalConfig {
    /// Base URL of the election service, including the `/api` prefix.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Seconds between tally refreshes while results are being watched.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Where the session token is kept between runs.
    #[serde(default = "default_session_file")]
    pub session_file: PathBuf,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_api_url() -> String {
    "http://127.0.0.1:3000/api".to_string()
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_session_file() -> PathBuf {
    PathBuf::from("./voto_session.json")
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl PortalConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, PortalError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| PortalError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, PortalError> {
        let config: Self = toml::from_str(s).map_err(|e| PortalError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, PortalError> {
        toml::to_string_pretty(self).map_err(|e| PortalError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), PortalError> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(PortalError::Config(format!(
                "api_url must be an http(s) URL, got {:?}",
                self.api_url
            )));
        }
        if self.poll_interval_secs == 0 {
            return Err(PortalError::Config("poll_interval_secs must be positive".into()));
        }
        Ok(())
    }

    pub fn http_timeouts(&self) -> HttpTimeouts {
        HttpTimeouts {
            request: Duration::from_secs(self.request_timeout_secs),
            connect: Duration::from_secs(self.connect_timeout_secs),
        }
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            poll_interval: Duration::from_secs(self.poll_interval_secs),
        }
    }
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            poll_interval_secs: default_poll_interval_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            session_file: default_session_file(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = PortalConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        let parsed = PortalConfig::from_toml_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = PortalConfig::from_toml_str("").unwrap();
        assert_eq!(config.api_url, "http://127.0.0.1:3000/api");
        assert_eq!(config.poll_interval_secs, 30);
        assert_eq!(config.log_format, LogFormat::Human);
        assert_eq!(config.sync_config().poll_interval, Duration::from_secs(30));
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            api_url = "https://votos.example.org/api"
            poll_interval_secs = 5
            log_format = "json"
        "#;
        let config = PortalConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.api_url, "https://votos.example.org/api");
        assert_eq!(config.poll_interval_secs, 5);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.http_timeouts().connect, Duration::from_secs(10));
    }

    #[test]
    fn rejects_zero_poll_interval_and_bad_url() {
        assert!(PortalConfig::from_toml_str("poll_interval_secs = 0").is_err());
        assert!(PortalConfig::from_toml_str(r#"api_url = "ftp://x""#).is_err());
    }

    #[test]
    fn missing_file_returns_config_error() {
        let err = PortalConfig::from_toml_file("/nonexistent/voto.toml").unwrap_err();
        assert!(matches!(err, PortalError::Config(_)));
    }
}
