//! Client classification.
//!
//! # Responsibilities
//! - Derive a coarse device class from the `User-Agent` header
//!
//! # Design Decisions
//! - Case-insensitive substring match against a fixed token list
//! - No regex in hot path
//! - Absent or empty header defaults to desktop
//! - Non-ASCII bytes are decoded lossily; tokens elsewhere in the value still count

use std::fmt;

use axum::http::{header, HeaderMap};
use serde::Serialize;

/// User-Agent tokens that identify mobile platforms (lowercase).
pub const MOBILE_TOKENS: [&str; 8] = [
    "android",
    "webos",
    "iphone",
    "ipad",
    "ipod",
    "blackberry",
    "iemobile",
    "opera mini",
];

/// Coarse client category used to pick an origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Mobile,
    Desktop,
}

impl DeviceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceClass::Mobile => "mobile",
            DeviceClass::Desktop => "desktop",
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-request client profile. Computed once, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientProfile {
    pub device_class: DeviceClass,
}

impl ClientProfile {
    /// Build the profile from request headers.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let user_agent = headers
            .get(header::USER_AGENT)
            .map(|v| String::from_utf8_lossy(v.as_bytes()));
        Self {
            device_class: classify(user_agent.as_deref()),
        }
    }
}

/// Classify a `User-Agent` value.
pub fn classify(user_agent: Option<&str>) -> DeviceClass {
    let Some(ua) = user_agent.filter(|ua| !ua.is_empty()) else {
        return DeviceClass::Desktop;
    };

    let ua = ua.to_ascii_lowercase();
    if MOBILE_TOKENS.iter().any(|token| ua.contains(token)) {
        DeviceClass::Mobile
    } else {
        DeviceClass::Desktop
    }
}
