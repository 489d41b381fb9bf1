//! Origin resolution.
//!
//! # Responsibilities
//! - Turn a client profile into a rewrite target host
//! - Static strategy: read the configured map
//! - Dynamic strategy: fetch the map from the configuration service
//!
//! # Design Decisions
//! - One lookup per request, never cached, never retried
//! - The lookup goes to the same origin as the incoming request
//! - Any lookup problem is a `ResolutionError`; the caller falls back to
//!   pass-through instead of guessing a host

use std::time::Duration;

use axum::http::{request::Parts, uri::Authority, HeaderName, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use super::classifier::{ClientProfile, DeviceClass};
use super::origin::{parse_host, OriginMap};
use crate::config::OriginSource;
use crate::http::headers::HeaderPolicy;

/// Why a site could not produce a rewrite target.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("configuration lookup failed: {0}")]
    Network(#[source] reqwest::Error),

    #[error("configuration lookup timed out after {0:?}")]
    Timeout(Duration),

    #[error("configuration service returned {0}")]
    Status(StatusCode),

    #[error("malformed configuration document: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("configuration document has no hosts object")]
    MissingHosts,

    #[error("configuration document has no {0} host")]
    MissingHost(DeviceClass),

    #[error("invalid origin host {0:?}")]
    InvalidHost(String),

    #[error("request has no origin to query")]
    NoOrigin,
}

impl ResolutionError {
    /// Short label for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            ResolutionError::Network(_) => "network",
            ResolutionError::Timeout(_) => "timeout",
            ResolutionError::Status(_) => "status",
            ResolutionError::Malformed(_) => "malformed",
            ResolutionError::MissingHosts => "missing_hosts",
            ResolutionError::MissingHost(_) => "missing_host",
            ResolutionError::InvalidHost(_) => "invalid_host",
            ResolutionError::NoOrigin => "no_origin",
        }
    }
}

/// Body served by the configuration endpoint. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
pub struct ConfigDocument {
    pub hosts: Option<HostsDocument>,
}

#[derive(Debug, Deserialize)]
pub struct HostsDocument {
    pub mobile: Option<String>,
    pub desktop: Option<String>,
}

impl ConfigDocument {
    /// Parse a response body.
    pub fn from_slice(body: &[u8]) -> Result<Self, ResolutionError> {
        serde_json::from_slice(body).map_err(ResolutionError::Malformed)
    }

    /// Validated host for a device class.
    pub fn host_for(&self, device: DeviceClass) -> Result<Authority, ResolutionError> {
        let hosts = self.hosts.as_ref().ok_or(ResolutionError::MissingHosts)?;
        let host = match device {
            DeviceClass::Mobile => hosts.mobile.as_deref(),
            DeviceClass::Desktop => hosts.desktop.as_deref(),
        };
        let host = host
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or(ResolutionError::MissingHost(device))?;
        parse_host(host).ok_or_else(|| ResolutionError::InvalidHost(host.to_string()))
    }
}

/// Origin strategy bound to a site.
#[derive(Debug, Clone)]
pub enum OriginResolver {
    Static(OriginMap),
    Dynamic(DynamicResolver),
}

impl OriginResolver {
    pub fn from_source(
        source: &OriginSource,
        client: reqwest::Client,
        deployment_header: &HeaderName,
    ) -> Self {
        match source {
            OriginSource::Static { mobile, desktop } => {
                OriginResolver::Static(OriginMap::new(mobile.clone(), desktop.clone()))
            }
            OriginSource::Dynamic { path, forward_headers, timeout_ms } => {
                OriginResolver::Dynamic(DynamicResolver {
                    client,
                    path: path.clone(),
                    headers: HeaderPolicy::from_names(forward_headers, deployment_header.clone()),
                    timeout: Duration::from_millis(*timeout_ms),
                })
            }
        }
    }

    /// Resolve the rewrite target for this request.
    ///
    /// `origin` is the request's original destination; only the dynamic
    /// strategy needs it.
    pub async fn resolve(
        &self,
        profile: ClientProfile,
        parts: &Parts,
        origin: Option<&Url>,
    ) -> Result<Authority, ResolutionError> {
        match self {
            OriginResolver::Static(map) => {
                let host = map.host_for(profile.device_class);
                parse_host(host).ok_or_else(|| ResolutionError::InvalidHost(host.to_string()))
            }
            OriginResolver::Dynamic(resolver) => {
                let origin = origin.ok_or(ResolutionError::NoOrigin)?;
                resolver.resolve(profile.device_class, parts, origin).await
            }
        }
    }
}

/// Fetches `{ hosts: { mobile, desktop } }` from the configuration endpoint.
#[derive(Debug, Clone)]
pub struct DynamicResolver {
    client: reqwest::Client,
    path: String,
    headers: HeaderPolicy,
    timeout: Duration,
}

impl DynamicResolver {
    /// Configuration endpoint URL on the request's origin.
    pub fn lookup_url(&self, origin: &Url) -> Url {
        let mut url = origin.clone();
        url.set_path(&self.path);
        url.set_query(None);
        url.set_fragment(None);
        url
    }

    pub async fn resolve(
        &self,
        device: DeviceClass,
        parts: &Parts,
        origin: &Url,
    ) -> Result<Authority, ResolutionError> {
        let url = self.lookup_url(origin);
        tracing::debug!(url = %url, device = %device, "Fetching origin configuration");

        let response = self
            .client
            .get(url)
            .headers(self.headers.select(&parts.headers))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolutionError::Status(status));
        }

        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;
        ConfigDocument::from_slice(&body)?.host_for(device)
    }

    fn transport_error(&self, error: reqwest::Error) -> ResolutionError {
        if error.is_timeout() {
            ResolutionError::Timeout(self.timeout)
        } else {
            ResolutionError::Network(error)
        }
    }
}
