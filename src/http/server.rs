//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the edge handler
//! - Wire up middleware (tracing, request ID, timeout, body limit, prefilters)
//! - Bind server to listener
//! - Dispatch every request to the edge router

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware,
    response::Response,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::EdgeConfig;
use crate::filters::{prefilter_middleware, Prefilters};
use crate::http::request::request_id_middleware;
use crate::lifecycle::shutdown;
use crate::routing::router::{BuildError, EdgeRouter};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<EdgeRouter>,
}

/// HTTP server for the edge router.
pub struct EdgeServer {
    router: Router,
    config: EdgeConfig,
}

impl EdgeServer {
    /// Create a new HTTP server from validated configuration.
    pub fn new(config: EdgeConfig) -> Result<Self, BuildError> {
        let edge_router = Arc::new(EdgeRouter::from_config(&config)?);
        let prefilters = Arc::new(Prefilters::from_config(&config));

        let state = AppState { router: edge_router };
        let router = Self::build_router(&config, state, prefilters);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &EdgeConfig, state: AppState, prefilters: Arc<Prefilters>) -> Router {
        Router::new()
            .route("/{*path}", any(edge_handler))
            .route("/", any(edge_handler))
            .with_state(state)
            .layer(middleware::from_fn_with_state(prefilters, prefilter_middleware))
            .layer(RequestBodyLimitLayer::new(config.limits.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(middleware::from_fn(request_id_middleware))
            .layer(TraceLayer::new_for_http())
    }

    /// The assembled router, for driving without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown_rx` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            sites = self.config.sites.len(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(shutdown_rx))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &EdgeConfig {
        &self.config
    }
}

/// Main edge handler.
async fn edge_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    state.router.handle(request).await
}
