//! Header manipulation.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers before anything crosses the edge
//! - Select the header subset sent to the configuration service
//!
//! # Design Decisions
//! - Hop-by-hop headers (RFC 9110 §7.6.1) describe one connection and are
//!   never forwarded, in either direction
//! - Headers named in `Connection` are treated as hop-by-hop too

use axum::http::{header, HeaderMap, HeaderName};

/// Connection-scoped headers.
pub const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(name)
}

/// Remove hop-by-hop headers, including any listed in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}

/// Which inbound headers accompany a configuration lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderPolicy {
    /// Every end-to-end header except the excluded one.
    All { exclude: HeaderName },
    /// Exactly the named headers.
    Only(Vec<HeaderName>),
}

impl HeaderPolicy {
    /// Build from configured names; a `"*"` entry selects every header.
    pub fn from_names(names: &[String], exclude: HeaderName) -> Self {
        if names.iter().any(|n| n == "*") {
            return HeaderPolicy::All { exclude };
        }
        HeaderPolicy::Only(
            names
                .iter()
                .filter_map(|n| HeaderName::from_bytes(n.as_bytes()).ok())
                .collect(),
        )
    }

    /// Copy the selected headers out of `inbound`, keeping repeated values.
    pub fn select(&self, inbound: &HeaderMap) -> HeaderMap {
        match self {
            HeaderPolicy::All { exclude } => {
                let mut headers = inbound.clone();
                strip_hop_by_hop(&mut headers);
                headers.remove(exclude);
                headers
            }
            HeaderPolicy::Only(names) => {
                let mut headers = HeaderMap::new();
                for name in names {
                    for value in inbound.get_all(name) {
                        headers.append(name.clone(), value.clone());
                    }
                }
                headers
            }
        }
    }
}
