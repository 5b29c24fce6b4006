//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the route table and gateway client from configuration
//! - Mount the client shell
//! - Start the metrics exporter
//! - Bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listener binds last (traffic only when ready)

use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::{ConfigError, GatewayConfig};
use crate::gateway::{ClientBuildError, GatewayClient};
use crate::http::GatewayServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics;
use crate::routing::{RouteTable, RouteTableError};
use crate::shell::{BubbleViewer, Document, MountError, Shell};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("route table: {0}")]
    Routes(#[from] RouteTableError),

    #[error("failed to read document {path:?}: {source}")]
    Document {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("mount failed: {0}")]
    Mount(#[from] MountError),

    #[error("gateway client: {0}")]
    Client(#[from] ClientBuildError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("metrics exporter: {0}")]
    Metrics(String),

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Load the shell document named by the config, or the built-in page.
pub fn load_document(config: &GatewayConfig) -> Result<Document, StartupError> {
    match &config.shell.document {
        Some(path) => {
            let path = PathBuf::from(path);
            let html = fs::read_to_string(&path)
                .map_err(|source| StartupError::Document { path, source })?;
            Ok(Document::new(html))
        }
        None => Ok(Document::builtin(&config.shell.title, &config.shell.anchor)),
    }
}

/// Build every subsystem the server needs, without binding anything.
pub fn prepare(config: &GatewayConfig) -> Result<GatewayServer, StartupError> {
    let routes = Arc::new(RouteTable::from_config(config)?);
    for route in routes.routes() {
        tracing::debug!(prefix = route.prefix(), target = %route.target(), "Route registered");
    }

    let shell = Shell::new(config.shell.anchor.clone(), Arc::new(BubbleViewer::new()));
    let app = shell.mount(load_document(config)?)?;
    let gateway = GatewayClient::from_config(config)?;

    Ok(GatewayServer::new(config, routes, app, gateway))
}

/// Start the dev gateway and serve until a stop signal arrives.
pub async fn run(config: GatewayConfig) -> Result<(), StartupError> {
    let server = prepare(&config)?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        backend = %config.backend.address,
        routes = config.routes.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|e| StartupError::Metrics(format!("invalid metrics address: {e}")))?;
        metrics::init_metrics(addr).map_err(StartupError::Metrics)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.listener.bind_address.clone(),
            source,
        })?;

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    server
        .run(listener, shutdown.subscribe())
        .await
        .map_err(StartupError::Serve)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_with_defaults() {
        assert!(prepare(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn missing_document_is_fatal() {
        let mut config = GatewayConfig::default();
        config.shell.document = Some("/nonexistent/index.html".into());
        assert!(matches!(
            prepare(&config),
            Err(StartupError::Document { .. })
        ));
    }

    #[test]
    fn document_without_anchor_is_fatal() {
        let dir = std::env::temp_dir().join(format!("bifrost-doc-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("index.html");
        fs::write(&path, "<html><body><main></main></body></html>").unwrap();

        let mut config = GatewayConfig::default();
        config.shell.document = Some(path.to_string_lossy().into_owned());
        let result = prepare(&config);
        fs::remove_dir_all(&dir).unwrap();

        assert!(matches!(
            result,
            Err(StartupError::Mount(MountError::MissingAnchor(anchor))) if anchor == "app"
        ));
    }
}
