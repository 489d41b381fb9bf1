//! Per-request routing decision and dispatch.
//!
//! # Responsibilities
//! - Store the site table
//! - Decide rewrite vs. pass-through for each request
//! - Hand the decision to the forwarder; exactly one dispatch per request
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Sites sorted by priority; first match wins
//! - Resolution failures fall back to pass-through, never to an error page
//!
//! ```text
//! START → CLASSIFY → RESOLVE → { REWRITE_FORWARD | FALLBACK_FORWARD } → RESPONDED
//! ```

use std::time::{Duration, Instant};

use axum::{
    body::Body,
    http::{request::Parts, uri::Authority, Request},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use super::classifier::{ClientProfile, DeviceClass};
use super::origin::{request_host, HostMatcher};
use super::resolver::OriginResolver;
use crate::config::{EdgeConfig, SiteConfig};
use crate::http::forward::Forwarder;
use crate::http::request::RequestIdExt;
use crate::observability::metrics;

/// Error building the router from configuration.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("forwarder.origin is required")]
    MissingOrigin,

    #[error("invalid forwarder.origin: {0}")]
    InvalidOrigin(#[source] url::ParseError),

    #[error("invalid header name {0:?}")]
    InvalidHeader(String),
}

/// A compiled site entry.
#[derive(Debug, Clone)]
pub struct Site {
    pub name: String,
    matcher: Option<HostMatcher>,
    resolver: OriginResolver,
}

impl Site {
    pub fn matches(&self, host: Option<&str>) -> bool {
        match &self.matcher {
            Some(matcher) => matcher.matches(host),
            None => true,
        }
    }
}

/// Why a request is forwarded unmodified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassThroughReason {
    /// No site matches the request host.
    NoMatchingSite,
    /// The matching site could not resolve an origin.
    ResolutionFailed,
}

/// Outcome of the decision phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Rewrite {
        site: String,
        device: DeviceClass,
        host: Authority,
    },
    PassThrough(PassThroughReason),
}

impl Decision {
    /// Rewrite target, if any.
    pub fn target(&self) -> Option<&Authority> {
        match self {
            Decision::Rewrite { host, .. } => Some(host),
            Decision::PassThrough(_) => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Decision::Rewrite { .. } => "rewrite",
            Decision::PassThrough(PassThroughReason::NoMatchingSite) => "pass_through",
            Decision::PassThrough(PassThroughReason::ResolutionFailed) => "fallback",
        }
    }
}

/// The edge router: classify, resolve, forward.
#[derive(Debug, Clone)]
pub struct EdgeRouter {
    sites: Vec<Site>,
    forwarder: Forwarder,
}

impl EdgeRouter {
    /// Build from validated configuration.
    pub fn from_config(config: &EdgeConfig) -> Result<Self, BuildError> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .no_proxy()
            .build()?;

        let forwarder = Forwarder::new(client.clone(), &config.forwarder, &config.timeouts)?;
        Ok(Self::new(&config.sites, forwarder, client))
    }

    /// Build from sites and a forwarder. `client` serves dynamic lookups.
    pub fn new(sites: &[SiteConfig], forwarder: Forwarder, client: reqwest::Client) -> Self {
        let mut ordered: Vec<&SiteConfig> = sites.iter().collect();
        // Stable sort keeps file order among equal priorities.
        ordered.sort_by(|a, b| b.priority.cmp(&a.priority));

        let sites = ordered
            .into_iter()
            .map(|site| Site {
                name: site.name.clone(),
                matcher: site.host.as_ref().map(HostMatcher::new),
                resolver: OriginResolver::from_source(
                    &site.origins,
                    client.clone(),
                    forwarder.deployment_header(),
                ),
            })
            .collect();

        Self { sites, forwarder }
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn forwarder(&self) -> &Forwarder {
        &self.forwarder
    }

    /// First site matching the request host.
    pub fn match_site(&self, parts: &Parts) -> Option<&Site> {
        let host = request_host(parts);
        self.sites.iter().find(|site| site.matches(host))
    }

    /// Decide where this request goes. Performs at most one lookup.
    pub async fn decide(&self, parts: &Parts) -> Decision {
        let Some(site) = self.match_site(parts) else {
            return Decision::PassThrough(PassThroughReason::NoMatchingSite);
        };

        let profile = ClientProfile::from_headers(&parts.headers);
        let origin = self.forwarder.original_url(parts).ok();

        match site.resolver.resolve(profile, parts, origin.as_ref()).await {
            Ok(host) => Decision::Rewrite {
                site: site.name.clone(),
                device: profile.device_class,
                host,
            },
            Err(e) => {
                tracing::warn!(
                    request_id = %parts.request_id(),
                    site = %site.name,
                    device = %profile.device_class,
                    reason = e.reason(),
                    error = %e,
                    "Origin resolution failed, passing request through"
                );
                metrics::record_resolution_failure(e.reason());
                Decision::PassThrough(PassThroughReason::ResolutionFailed)
            }
        }
    }

    /// Handle one request end to end. Always produces a response.
    pub async fn handle(&self, request: Request<Body>) -> Response {
        let start_time = Instant::now();
        let (parts, body) = request.into_parts();

        let decision = self.decide(&parts).await;
        match &decision {
            Decision::Rewrite { site, device, host } => tracing::debug!(
                request_id = %parts.request_id(),
                method = %parts.method,
                path = %parts.uri.path(),
                site = %site,
                device = %device,
                target = %host,
                "Rewriting request"
            ),
            Decision::PassThrough(reason) => tracing::debug!(
                request_id = %parts.request_id(),
                method = %parts.method,
                path = %parts.uri.path(),
                reason = ?reason,
                "Passing request through"
            ),
        }

        let response = match self.forwarder.forward(&parts, body, decision.target()).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(
                    request_id = %parts.request_id(),
                    decision = decision.label(),
                    error = %e,
                    "Upstream error"
                );
                e.into_response()
            }
        };

        metrics::record_request(decision.label(), response.status().as_u16(), start_time);
        response
    }
}
