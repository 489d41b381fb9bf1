//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the edge router.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the edge router.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EdgeConfig {
    /// Listener configuration.
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Outbound dispatch settings.
    pub forwarder: ForwarderConfig,

    /// Sites mapping incoming hosts to origin strategies.
    pub sites: Vec<SiteConfig>,

    /// Host redirects evaluated before routing.
    pub redirects: Vec<RedirectConfig>,

    /// Optional pre-filter stage (forbidden hosts, robots.txt).
    pub prefilter: PrefilterConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout for outbound calls in seconds.
    pub connect_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// Deadline for one upstream dispatch in seconds. Must stay below
    /// `request_secs` so a slow origin is answered with 504.
    pub upstream_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
            upstream_secs: 25,
        }
    }
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum inbound body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// Outbound dispatch configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ForwarderConfig {
    /// Original destination for pass-through traffic and dynamic lookups
    /// (e.g., "http://127.0.0.1:3000"). Required; the edge never forwards to
    /// a host named by the client.
    pub origin: Option<String>,

    /// Scheme used when dispatching to a rewritten host.
    pub upstream_scheme: String,

    /// Internal deployment-identifier header removed from rewritten requests.
    pub deployment_header: String,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            origin: None,
            upstream_scheme: "https".to_string(),
            deployment_header: "x-deployment-id".to_string(),
        }
    }
}

/// A site: host matcher plus the strategy that picks its origins.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SiteConfig {
    /// Site identifier for logging/metrics.
    pub name: String,

    /// Host to match (exact, case-insensitive). `None` matches every host.
    #[serde(default)]
    pub host: Option<String>,

    /// Site priority (higher = checked first).
    #[serde(default)]
    pub priority: u32,

    /// Where device-class origins come from.
    pub origins: OriginSource,
}

/// Origin resolution strategy for a site.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum OriginSource {
    /// Hosts fixed in configuration.
    Static { mobile: String, desktop: String },

    /// Hosts fetched per request from a configuration endpoint on the same origin.
    Dynamic {
        /// Endpoint path on the original destination.
        #[serde(default = "default_config_path")]
        path: String,

        /// Inbound headers copied onto the lookup. `"*"` copies all of them.
        #[serde(default = "default_forward_headers")]
        forward_headers: Vec<String>,

        /// Lookup deadline in milliseconds.
        #[serde(default = "default_lookup_timeout_ms")]
        timeout_ms: u64,
    },
}

pub fn default_config_path() -> String {
    "/api/data".to_string()
}

pub fn default_forward_headers() -> Vec<String> {
    ["host", "cookie", "authorization", "x-forwarded-host", "x-forwarded-proto"]
        .iter()
        .map(|h| h.to_string())
        .collect()
}

pub fn default_lookup_timeout_ms() -> u64 {
    3000
}

/// Host redirect rule.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RedirectConfig {
    /// Source host (exact, case-insensitive).
    pub host: String,

    /// Absolute `Location` to send the client to.
    pub location: String,

    /// Redirect status code (default: 302).
    #[serde(default = "default_redirect_status")]
    pub status: u16,
}

fn default_redirect_status() -> u16 {
    302
}

/// Pre-filter stage configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PrefilterConfig {
    /// Hosts answered with 403 Forbidden.
    pub forbidden_hosts: Vec<String>,

    /// Crawler blocking.
    pub robots: RobotsConfig,
}

/// robots.txt crawler blocking.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RobotsConfig {
    /// Serve a disallow-all robots.txt for every host.
    pub block_all: bool,

    /// Hosts that get a disallow-all robots.txt.
    pub block_hosts: Vec<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}
