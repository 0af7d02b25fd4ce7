//! Server configuration

use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use atc_logging::LogConfig;

use crate::error::ServerResult;
use crate::handler::DEFAULT_CHANNEL_CAPACITY;

/// Default listen port
pub const DEFAULT_PORT: u16 = 8080;

/// Configuration for the `atc-events` server
///
/// ```toml
/// bind = "0.0.0.0:8080"
/// fixtures_dir = "./builds"
/// channel_capacity = 1
///
/// [log]
/// default_level = "debug"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to listen on
    pub bind: SocketAddr,
    /// Directory of `<build-id>.jsonl` fixtures to serve
    pub fixtures_dir: Option<PathBuf>,
    /// Encoded events a pump may run ahead of its client
    pub channel_capacity: usize,
    /// Logging configuration
    pub log: LogConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            fixtures_dir: None,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            log: LogConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Parse a TOML configuration
    pub fn from_toml(contents: &str) -> ServerResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Load a TOML configuration file
    pub fn load(path: impl AsRef<Path>) -> ServerResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Set the listen address
    pub fn with_bind(mut self, bind: SocketAddr) -> Self {
        self.bind = bind;
        self
    }

    /// Set the fixtures directory
    pub fn with_fixtures_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.fixtures_dir = Some(dir.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServerError;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind.port(), DEFAULT_PORT);
        assert!(config.fixtures_dir.is_none());
        assert_eq!(config.channel_capacity, DEFAULT_CHANNEL_CAPACITY);
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(ServerConfig::from_toml("").unwrap(), ServerConfig::default());
    }

    #[test]
    fn test_from_toml() {
        let config = ServerConfig::from_toml(
            r#"
            bind = "0.0.0.0:9000"
            fixtures_dir = "./builds"
            channel_capacity = 16

            [log]
            default_level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.bind.port(), 9000);
        assert_eq!(config.fixtures_dir, Some(PathBuf::from("./builds")));
        assert_eq!(config.channel_capacity, 16);
        assert_eq!(config.log.default_level, "debug");
        assert!(config.log.console.enabled);
    }

    #[test]
    fn test_invalid_toml() {
        let err = ServerConfig::from_toml("bind = 42").unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = ServerConfig::load("/nonexistent/atc-events.toml").unwrap_err();
        assert!(matches!(err, ServerError::Io(_)));
    }

    #[test]
    fn test_builders() {
        let bind: SocketAddr = "127.0.0.1:1234".parse().unwrap();
        let config = ServerConfig::default()
            .with_bind(bind)
            .with_fixtures_dir("/srv/builds");
        assert_eq!(config.bind, bind);
        assert_eq!(config.fixtures_dir, Some(PathBuf::from("/srv/builds")));
    }
}
