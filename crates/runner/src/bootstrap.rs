//! Startup helpers: logging and configuration

use crate::error::{Error, Result};
use fixgate_gateway::{ClientConfig, ServerConfig};
use log::info;
use std::path::Path;

/// Server port override
pub const GATEWAY_PORT_ENV: &str = "GATEWAY_PORT";
/// Client target port override
pub const SERVER_PORT_ENV: &str = "SERVER_PORT";

/// Install the process-wide logger. `RUST_LOG` filters; defaults to `info`.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}

/// Server config from `path` (or defaults), then `GATEWAY_PORT`
pub fn server_config(path: Option<&Path>) -> Result<ServerConfig> {
    let config = match path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            ServerConfig::from_file(path)?
        }
        None => ServerConfig::default(),
    };
    let port = std::env::var(GATEWAY_PORT_ENV).ok();
    apply_port(config, port, GATEWAY_PORT_ENV, |c, port| c.port = port)
}

/// Client config from `path` (or defaults), then `SERVER_PORT`.
///
/// `SERVER_HOST` is applied when the client is constructed.
pub fn client_config(path: Option<&Path>) -> Result<ClientConfig> {
    let config = match path {
        Some(path) => ClientConfig::from_file(path)?,
        None => ClientConfig::default(),
    };
    let port = std::env::var(SERVER_PORT_ENV).ok();
    apply_port(config, port, SERVER_PORT_ENV, |c, port| c.port = port)
}

fn apply_port<C>(
    mut config: C,
    value: Option<String>,
    var: &str,
    set: impl FnOnce(&mut C, u16),
) -> Result<C> {
    if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
        let port = value.trim().parse::<u16>().map_err(|_| Error::InvalidEnv {
            var: var.to_string(),
            value: value.clone(),
        })?;
        set(&mut config, port);
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn set_port(config: &mut ServerConfig, port: u16) {
        config.port = port;
    }

    #[test]
    fn test_port_override() {
        let config = apply_port(
            ServerConfig::default(),
            Some("9100".into()),
            GATEWAY_PORT_ENV,
            set_port,
        )
        .unwrap();
        assert_eq!(config.port, 9100);

        let config = apply_port(ServerConfig::default(), None, GATEWAY_PORT_ENV, set_port).unwrap();
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_bad_port_override() {
        let err = apply_port(
            ServerConfig::default(),
            Some("eighty".into()),
            GATEWAY_PORT_ENV,
            set_port,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for GATEWAY_PORT: 'eighty'");
    }

    #[test]
    fn test_server_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"port": 7001, "max_connections": 16}}"#).unwrap();

        let config = server_config(Some(file.path())).unwrap();
        assert_eq!(config.max_connections, 16);
        assert_eq!(config.thread_pool_size, 4);
    }

    #[test]
    fn test_missing_config_file() {
        let err = server_config(Some(Path::new("/no/such/gateway.json"))).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
