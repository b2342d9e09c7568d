//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Initialize logging and, when enabled, the metrics exporter
//! - Build the gateway and bind its listener
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - The listener is bound last (traffic only when ready)

use std::net::SocketAddr;
use std::path::Path;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::loader::{load_config, ConfigError};
use crate::config::schema::GatewayAppConfig;
use crate::error::ConfigurationError;
use crate::http::server::HttpServer;
use crate::observability::{logging, metrics};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Gateway(#[from] ConfigurationError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// A server ready to run, with its bound listener.
pub struct Started {
    pub server: HttpServer,
    pub listener: TcpListener,
    pub local_addr: SocketAddr,
}

/// Load `path` and bring everything up to the point of serving.
pub async fn start(path: &Path) -> Result<Started, StartupError> {
    let config = load_config(path)?;
    logging::init(&config.observability);

    tracing::info!(
        config = %path.display(),
        bind_address = %config.listener.bind_address,
        mount = %config.gateway.mount,
        setting = %config.gateway.setting,
        "Configuration loaded"
    );

    start_with(config).await
}

/// Bring up an already loaded configuration.
pub async fn start_with(config: GatewayAppConfig) -> Result<Started, StartupError> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Err(err) = metrics::init_metrics(addr) {
                    tracing::error!(error = %err, "Failed to install metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let address = config.listener.bind_address.clone();
    let server = HttpServer::new(config)?;

    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.clone(),
            source,
        })?;
    let local_addr = listener
        .local_addr()
        .map_err(|source| StartupError::Bind { address, source })?;

    tracing::info!(address = %local_addr, "Listening for connections");

    Ok(Started {
        server,
        listener,
        local_addr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::parse_config;

    const CONFIG: &str = r#"
        [listener]
        bind_address = "127.0.0.1:0"

        [gateway]
        mount = "/gw"

        [api]
        url = "http://127.0.0.1:9"

        [api.gateway]
        ping = "/ping"
    "#;

    #[tokio::test]
    async fn test_start_binds_ephemeral_port() {
        let started = start_with(parse_config(CONFIG).unwrap()).await.unwrap();
        assert_ne!(started.local_addr.port(), 0);
        assert_eq!(started.server.controller().routes().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = start(Path::new("/nonexistent/gateway.toml")).await.err().unwrap();
        assert!(matches!(err, StartupError::Config(ConfigError::Io { .. })));
    }
}
