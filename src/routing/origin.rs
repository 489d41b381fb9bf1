//! Origin maps and host handling.
//!
//! # Responsibilities
//! - Hold the device class → hostname mapping
//! - Parse and validate hostnames used as rewrite targets
//! - Extract and match the incoming request host
//!
//! # Design Decisions
//! - Host matching is case-insensitive and ignores the port (RFC 9110 §4.2.3)
//! - A rewrite target must be a bare authority: no scheme, path or userinfo

use axum::http::{header, request::Parts, uri::Authority};
use serde::{Deserialize, Serialize};

use super::classifier::DeviceClass;

/// Hostnames per device class.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct OriginMap {
    pub mobile: String,
    pub desktop: String,
}

impl OriginMap {
    pub fn new(mobile: impl Into<String>, desktop: impl Into<String>) -> Self {
        Self {
            mobile: mobile.into(),
            desktop: desktop.into(),
        }
    }

    /// Hostname for the given device class.
    pub fn host_for(&self, device: DeviceClass) -> &str {
        match device {
            DeviceClass::Mobile => &self.mobile,
            DeviceClass::Desktop => &self.desktop,
        }
    }
}

/// Parse a rewrite target (`host` or `host:port`).
pub fn parse_host(value: &str) -> Option<Authority> {
    if value.is_empty() || value.contains('@') {
        return None;
    }
    value.parse::<Authority>().ok()
}

/// Authority the client addressed (host plus optional port): URI first,
/// then the `Host` header.
pub fn request_authority(parts: &Parts) -> Option<&str> {
    parts
        .uri
        .authority()
        .map(|a| a.as_str())
        .or_else(|| parts.headers.get(header::HOST).and_then(|h| h.to_str().ok()))
        .filter(|a| !a.is_empty())
}

/// Host the client addressed, without port.
pub fn request_host(parts: &Parts) -> Option<&str> {
    request_authority(parts).map(strip_port)
}

/// Lowercase a host and drop any port for comparison.
pub fn normalize_host(host: &str) -> String {
    strip_port(host).trim_end_matches('.').to_ascii_lowercase()
}

fn strip_port(host: &str) -> &str {
    // Bracketed IPv6 literals carry colons of their own.
    if let Some(end) = host.find(']') {
        return &host[..=end];
    }
    host.split(':').next().unwrap_or(host)
}

/// Matches the request host against a configured name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostMatcher {
    expected_host: String,
}

impl HostMatcher {
    /// Create a new host matcher.
    /// The host is normalized for case-insensitive matching.
    pub fn new(host: impl AsRef<str>) -> Self {
        Self {
            expected_host: normalize_host(host.as_ref()),
        }
    }

    pub fn matches(&self, host: Option<&str>) -> bool {
        host.map(|h| normalize_host(h) == self.expected_host)
            .unwrap_or(false)
    }
}
