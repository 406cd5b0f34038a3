//! Server and client configuration
//!
//! Both configs are plain serde DTOs. Every field has a default so a partial
//! JSON document (or `{}`) is a valid configuration.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable that overrides the client's target host
pub const SERVER_HOST_ENV: &str = "SERVER_HOST";

/// Gateway server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen port; 0 lets the OS pick one
    #[serde(default = "default_port")]
    pub port: u16,

    /// Concurrent connection cap; further connections are closed on accept
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    /// Number of worker threads draining the queue
    #[serde(default = "default_thread_pool_size")]
    pub thread_pool_size: usize,

    /// Idle read timeout per connection, in milliseconds
    #[serde(default = "default_client_timeout_ms")]
    pub client_timeout_ms: u64,

    /// How long a worker waits on an empty queue before rechecking shutdown
    #[serde(default = "default_queue_pop_timeout_ms")]
    pub queue_pop_timeout_ms: u64,
}

fn default_port() -> u16 {
    8080
}

fn default_max_connections() -> usize {
    1000
}

fn default_thread_pool_size() -> usize {
    4
}

fn default_client_timeout_ms() -> u64 {
    5000
}

fn default_queue_pop_timeout_ms() -> u64 {
    100
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            max_connections: default_max_connections(),
            thread_pool_size: default_thread_pool_size(),
            client_timeout_ms: default_client_timeout_ms(),
            queue_pop_timeout_ms: default_queue_pop_timeout_ms(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = read_config(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn client_timeout(&self) -> Duration {
        Duration::from_millis(self.client_timeout_ms)
    }

    pub fn queue_pop_timeout(&self) -> Duration {
        Duration::from_millis(self.queue_pop_timeout_ms)
    }
}

/// Gateway client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Connect deadline, also applied to every read and write
    #[serde(default = "default_client_io_timeout_ms")]
    pub timeout_ms: u64,

    /// Connection attempts made by a reconnect
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: usize,

    /// Delay after the first failed attempt; doubles on each further failure
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_client_io_timeout_ms() -> u64 {
    1000
}

fn default_retry_attempts() -> usize {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    100
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_ms: default_client_io_timeout_ms(),
            retry_attempts: default_retry_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
        }
    }
}

impl ClientConfig {
    /// Config targeting `host:port` with every other field defaulted
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = read_config(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Apply `SERVER_HOST` if it is set and non-empty
    pub fn with_env_overrides(self) -> Self {
        self.with_host_override(std::env::var(SERVER_HOST_ENV).ok())
    }

    fn with_host_override(mut self, host: Option<String>) -> Self {
        if let Some(host) = host.filter(|h| !h.trim().is_empty()) {
            self.host = host;
        }
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Sleep before the next attempt after failed attempt number `attempt` (0-based)
    pub fn backoff_delay(&self, attempt: usize) -> Duration {
        let factor = 1u32 << attempt.min(16);
        Duration::from_millis(self.retry_base_delay_ms).saturating_mul(factor)
    }
}

fn read_config(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.max_connections, 1000);
        assert_eq!(config.thread_pool_size, 4);
        assert_eq!(config.client_timeout(), Duration::from_secs(5));
        assert_eq!(config.queue_pop_timeout(), Duration::from_millis(100));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ServerConfig::from_json(r#"{"port": 9000, "thread_pool_size": 2}"#).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.thread_pool_size, 2);
        assert_eq!(config.max_connections, 1000);

        let client = ClientConfig::from_json("{}").unwrap();
        assert_eq!(client, ClientConfig::default());
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let err = ClientConfig::from_json("{ port: nope }").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.json");
        std::fs::write(&path, r#"{"host": "10.0.0.5", "retry_attempts": 5}"#).unwrap();

        let config = ClientConfig::from_file(&path).unwrap();
        assert_eq!(config.host, "10.0.0.5");
        assert_eq!(config.retry_attempts, 5);
        assert_eq!(config.port, 8080);

        let missing = ClientConfig::from_file(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }

    #[test]
    fn test_backoff_doubles() {
        let config = ClientConfig::default();
        assert_eq!(config.backoff_delay(0), Duration::from_millis(100));
        assert_eq!(config.backoff_delay(1), Duration::from_millis(200));
        assert_eq!(config.backoff_delay(2), Duration::from_millis(400));
    }

    #[test]
    fn test_host_override() {
        let config = ClientConfig::new("localhost", 8080);
        assert_eq!(
            config.clone().with_host_override(Some("gateway.internal".into())).host,
            "gateway.internal"
        );
        assert_eq!(config.clone().with_host_override(Some("  ".into())).host, "localhost");
        assert_eq!(config.with_host_override(None).host, "localhost");
    }
}
