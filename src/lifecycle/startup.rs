//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the server from validated configuration
//! - Start background exporters (metrics)
//! - Bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds last (traffic only when ready)

use thiserror::Error;
use tokio::net::TcpListener;

use super::shutdown::Shutdown;
use crate::config::EdgeConfig;
use crate::http::EdgeServer;
use crate::observability::metrics;
use crate::routing::router::BuildError;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to build router: {0}")]
    Build(#[from] BuildError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Start the edge router and serve until `shutdown` is triggered.
pub async fn start(config: EdgeConfig, shutdown: &Shutdown) -> Result<(), StartupError> {
    tracing::info!(
        bind_address = %config.listener.bind_address,
        sites = config.sites.len(),
        redirects = config.redirects.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let bind_address = config.listener.bind_address.clone();
    let server = EdgeServer::new(config)?;

    let listener = TcpListener::bind(&bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: bind_address.clone(),
            source,
        })?;

    server
        .run(listener, shutdown.subscribe())
        .await
        .map_err(StartupError::Serve)
}
