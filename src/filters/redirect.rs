//! Host redirects.

use axum::http::{HeaderValue, StatusCode};

use crate::config::RedirectConfig;
use crate::routing::origin::HostMatcher;

#[derive(Debug, Clone)]
pub struct Redirect {
    matcher: HostMatcher,
    pub location: HeaderValue,
    pub status: StatusCode,
}

/// Redirect table; first matching host wins.
#[derive(Debug, Clone, Default)]
pub struct Redirects {
    rules: Vec<Redirect>,
}

impl Redirects {
    /// Rules with an unusable location or status are skipped (validation
    /// rejects them before this point).
    pub fn from_config(config: &[RedirectConfig]) -> Self {
        let rules = config
            .iter()
            .filter_map(|r| {
                let location = HeaderValue::from_str(&r.location).ok()?;
                let status = StatusCode::from_u16(r.status)
                    .ok()
                    .filter(StatusCode::is_redirection)?;
                Some(Redirect {
                    matcher: HostMatcher::new(&r.host),
                    location,
                    status,
                })
            })
            .collect();
        Self { rules }
    }

    pub fn find(&self, host: Option<&str>) -> Option<&Redirect> {
        self.rules.iter().find(|r| r.matcher.matches(host))
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
