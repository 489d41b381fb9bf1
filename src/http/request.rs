//! Request identity.
//!
//! # Responsibilities
//! - Reuse the client's `x-request-id` or generate a UUID v4
//! - Store it in request extensions for logging
//! - Echo it on the response
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The ID lives in extensions only, so forwarded headers stay exactly as
//!   the client sent them

use std::fmt;

use axum::{
    body::Body,
    http::{request::Parts, HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Correlation ID attached to every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(String);

impl RequestId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Read the request ID from extensions.
pub trait RequestIdExt {
    fn request_id(&self) -> &str;
}

impl RequestIdExt for Parts {
    fn request_id(&self) -> &str {
        self.extensions
            .get::<RequestId>()
            .map(RequestId::as_str)
            .unwrap_or("unknown")
    }
}

impl<B> RequestIdExt for Request<B> {
    fn request_id(&self) -> &str {
        self.extensions()
            .get::<RequestId>()
            .map(RequestId::as_str)
            .unwrap_or("unknown")
    }
}

/// Middleware assigning a [`RequestId`].
pub async fn request_id_middleware(mut request: Request<Body>, next: Next) -> Response {
    let id = request
        .headers()
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= 128)
        .map(|v| RequestId(v.to_string()))
        .unwrap_or_else(RequestId::generate);

    request.extensions_mut().insert(id.clone());
    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(id.as_str()) {
        response.headers_mut().insert(X_REQUEST_ID, value);
    }
    response
}
