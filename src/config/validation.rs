//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate hosts, URLs, header names and addresses
//! - Validate value ranges (timeouts > 0, redirect status codes)
//! - Detect duplicate site names
//! - Require a pass-through origin that is not the edge itself
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: EdgeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};

use axum::http::HeaderName;
use thiserror::Error;
use url::Url;

use crate::config::schema::{EdgeConfig, OriginSource};
use crate::routing::origin::parse_host;

/// Redirect codes accepted in `[[redirects]]`.
pub const REDIRECT_STATUSES: [u16; 5] = [301, 302, 303, 307, 308];

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address {value:?}")]
    InvalidAddress { field: String, value: String },

    #[error("{field}: unsupported scheme {value:?} (expected http or https)")]
    InvalidScheme { field: String, value: String },

    #[error("{field}: invalid URL {value:?}")]
    InvalidUrl { field: String, value: String },

    #[error("{field}: invalid host {value:?}")]
    InvalidHost { field: String, value: String },

    #[error("{field}: invalid header name {value:?}")]
    InvalidHeader { field: String, value: String },

    #[error("{field}: must be greater than zero")]
    Zero { field: String },

    #[error("{field}: path {value:?} must start with '/'")]
    InvalidPath { field: String, value: String },

    #[error("{field}: {value} is not a redirect status")]
    InvalidRedirectStatus { field: String, value: u16 },

    #[error("duplicate site name {0:?}")]
    DuplicateSite(String),

    #[error("{field}: required")]
    Missing { field: String },

    #[error("forwarder.origin {origin:?} points back at listener {listener}")]
    OriginLoop { origin: String, listener: String },

    #[error("timeouts.upstream_secs ({upstream}) must be below timeouts.request_secs ({request})")]
    UpstreamTimeout { upstream: u64, request: u64 },
}

/// Validate a parsed configuration, collecting every error found.
pub fn validate_config(config: &EdgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.connect_secs".into() });
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.request_secs".into() });
    }
    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.upstream_secs".into() });
    } else if config.timeouts.upstream_secs >= config.timeouts.request_secs {
        errors.push(ValidationError::UpstreamTimeout {
            upstream: config.timeouts.upstream_secs,
            request: config.timeouts.request_secs,
        });
    }
    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::Zero { field: "limits.max_body_bytes".into() });
    }

    let forwarder = &config.forwarder;
    check_scheme(&mut errors, "forwarder.upstream_scheme", &forwarder.upstream_scheme);
    check_header(&mut errors, "forwarder.deployment_header", &forwarder.deployment_header);
    match &forwarder.origin {
        None => errors.push(ValidationError::Missing { field: "forwarder.origin".into() }),
        Some(origin) => match Url::parse(origin) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.host_str().is_some() => {
                if let Ok(listener) = config.listener.bind_address.parse::<SocketAddr>() {
                    if points_at(&url, listener) {
                        errors.push(ValidationError::OriginLoop {
                            origin: origin.clone(),
                            listener: config.listener.bind_address.clone(),
                        });
                    }
                }
            }
            _ => errors.push(ValidationError::InvalidUrl {
                field: "forwarder.origin".into(),
                value: origin.clone(),
            }),
        },
    }

    let mut names = HashSet::new();
    for (i, site) in config.sites.iter().enumerate() {
        let prefix = format!("sites[{}]", i);
        if !names.insert(site.name.as_str()) {
            errors.push(ValidationError::DuplicateSite(site.name.clone()));
        }
        if let Some(host) = &site.host {
            check_host(&mut errors, &format!("{}.host", prefix), host);
        }
        match &site.origins {
            OriginSource::Static { mobile, desktop } => {
                check_host(&mut errors, &format!("{}.origins.mobile", prefix), mobile);
                check_host(&mut errors, &format!("{}.origins.desktop", prefix), desktop);
            }
            OriginSource::Dynamic { path, forward_headers, timeout_ms } => {
                if !path.starts_with('/') {
                    errors.push(ValidationError::InvalidPath {
                        field: format!("{}.origins.path", prefix),
                        value: path.clone(),
                    });
                }
                for name in forward_headers.iter().filter(|h| h.as_str() != "*") {
                    check_header(&mut errors, &format!("{}.origins.forward_headers", prefix), name);
                }
                if *timeout_ms == 0 {
                    errors.push(ValidationError::Zero {
                        field: format!("{}.origins.timeout_ms", prefix),
                    });
                }
            }
        }
    }

    for (i, redirect) in config.redirects.iter().enumerate() {
        let prefix = format!("redirects[{}]", i);
        check_host(&mut errors, &format!("{}.host", prefix), &redirect.host);
        if Url::parse(&redirect.location).is_err() {
            errors.push(ValidationError::InvalidUrl {
                field: format!("{}.location", prefix),
                value: redirect.location.clone(),
            });
        }
        if !REDIRECT_STATUSES.contains(&redirect.status) {
            errors.push(ValidationError::InvalidRedirectStatus {
                field: format!("{}.status", prefix),
                value: redirect.status,
            });
        }
    }

    for host in &config.prefilter.forbidden_hosts {
        check_host(&mut errors, "prefilter.forbidden_hosts", host);
    }
    for host in &config.prefilter.robots.block_hosts {
        check_host(&mut errors, "prefilter.robots.block_hosts", host);
    }

    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// True when `origin` would be served by this process's own listener.
fn points_at(origin: &Url, listener: SocketAddr) -> bool {
    if origin.port_or_known_default() != Some(listener.port()) {
        return false;
    }
    let host = origin.host_str().unwrap_or_default();
    let host = host.trim_start_matches('[').trim_end_matches(']');
    match host.parse::<IpAddr>() {
        Ok(ip) if listener.ip().is_unspecified() => ip.is_loopback() || ip.is_unspecified(),
        Ok(ip) => ip == listener.ip(),
        Err(_) => {
            host.eq_ignore_ascii_case("localhost")
                && (listener.ip().is_unspecified() || listener.ip().is_loopback())
        }
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
}

fn check_scheme(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if !matches!(value, "http" | "https") {
        errors.push(ValidationError::InvalidScheme {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
}

fn check_host(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if parse_host(value).is_none() {
        errors.push(ValidationError::InvalidHost {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
}

fn check_header(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if HeaderName::from_bytes(value.as_bytes()).is_err() {
        errors.push(ValidationError::InvalidHeader {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
}
