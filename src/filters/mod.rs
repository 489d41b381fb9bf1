//! Pre-filter stage ahead of the router.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → forbidden host?     → 403
//!     → robots.txt blocked? → disallow-all robots.txt
//!     → redirect rule?      → 30x + Location (redirect.rs)
//!     → otherwise hand over to the router
//! ```
//!
//! # Design Decisions
//! - Every filter is off unless configured
//! - A filtered request never reaches an origin

pub mod redirect;
pub mod robots;

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, request::Parts, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::EdgeConfig;
use crate::http::request::RequestIdExt;
use crate::observability::metrics;
use crate::routing::origin::{request_host, HostMatcher};

pub use redirect::Redirects;
pub use robots::RobotsBlock;

/// What the pre-filter stage decided for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrefilterAction {
    Forbidden,
    Robots,
    Redirect { status: StatusCode, location: HeaderValue },
}

impl PrefilterAction {
    pub fn label(&self) -> &'static str {
        match self {
            PrefilterAction::Forbidden => "forbidden",
            PrefilterAction::Robots => "robots",
            PrefilterAction::Redirect { .. } => "redirect",
        }
    }
}

impl IntoResponse for PrefilterAction {
    fn into_response(self) -> Response {
        match self {
            PrefilterAction::Forbidden => (StatusCode::FORBIDDEN, "Forbidden").into_response(),
            PrefilterAction::Robots => (
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                robots::DISALLOW_ALL,
            )
                .into_response(),
            PrefilterAction::Redirect { status, location } => {
                (status, [(header::LOCATION, location)]).into_response()
            }
        }
    }
}

/// Compiled pre-filters.
#[derive(Debug, Clone, Default)]
pub struct Prefilters {
    forbidden: Vec<HostMatcher>,
    robots: RobotsBlock,
    redirects: Redirects,
}

impl Prefilters {
    pub fn from_config(config: &EdgeConfig) -> Self {
        Self {
            forbidden: config
                .prefilter
                .forbidden_hosts
                .iter()
                .map(HostMatcher::new)
                .collect(),
            robots: RobotsBlock::from_config(&config.prefilter.robots),
            redirects: Redirects::from_config(&config.redirects),
        }
    }

    /// Evaluate filters in order; `None` lets the request through.
    pub fn evaluate(&self, parts: &Parts) -> Option<PrefilterAction> {
        let host = request_host(parts);

        if self.forbidden.iter().any(|m| m.matches(host)) {
            return Some(PrefilterAction::Forbidden);
        }
        if self.robots.blocks(host, parts.uri.path()) {
            return Some(PrefilterAction::Robots);
        }
        self.redirects.find(host).map(|r| PrefilterAction::Redirect {
            status: r.status,
            location: r.location.clone(),
        })
    }
}

/// Middleware answering filtered requests before they reach the router.
pub async fn prefilter_middleware(
    State(prefilters): State<Arc<Prefilters>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();

    match prefilters.evaluate(&parts) {
        Some(action) => {
            tracing::info!(
                request_id = %parts.request_id(),
                host = ?request_host(&parts),
                path = %parts.uri.path(),
                action = action.label(),
                "Request answered by prefilter"
            );
            metrics::record_prefilter(action.label());
            action.into_response()
        }
        None => next.run(Request::from_parts(parts, body)).await,
    }
}
