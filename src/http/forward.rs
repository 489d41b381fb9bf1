//! Outbound dispatch.
//!
//! # Responsibilities
//! - Work out the original destination of a request
//! - Build the outbound request (rewritten or pass-through)
//! - Dispatch it once and stream the upstream response back
//!
//! # Design Decisions
//! - The original destination is always the configured origin, never a host
//!   taken from the request (no open relay, no loop through the edge)
//! - Upstream responses are returned as-is; redirects are not followed
//! - GET/HEAD never carry a body upstream
//! - The inbound request is consumed, never mutated in place
//! - Upstream failures map to 502, upstream timeouts to 504

use std::error::Error as StdError;
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    http::{header, request::Parts, uri::Authority, HeaderName, Method, StatusCode},
    response::{IntoResponse, Response},
};
use http_body_util::LengthLimitError;
use thiserror::Error;
use url::Url;

use crate::config::schema::TimeoutConfig;
use crate::config::ForwarderConfig;
use crate::http::headers::strip_hop_by_hop;
use crate::routing::router::BuildError;

/// Upstream dispatch failure.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("upstream timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    #[error("upstream request failed: {0}")]
    Upstream(#[source] reqwest::Error),

    #[error("failed to read request body: {0}")]
    Body(#[source] axum::Error),

    #[error("request body exceeds the configured limit")]
    PayloadTooLarge,

    #[error("invalid upstream URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ForwardError {
    /// Status returned to the client.
    pub fn status(&self) -> StatusCode {
        match self {
            ForwardError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ForwardError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ForwardError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ForwardError::Body(_) | ForwardError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn from_body(error: axum::Error) -> Self {
        let mut source: Option<&(dyn StdError + 'static)> = Some(&error);
        while let Some(e) = source {
            if e.is::<LengthLimitError>() {
                return ForwardError::PayloadTooLarge;
            }
            source = e.source();
        }
        ForwardError::Body(error)
    }
}

impl IntoResponse for ForwardError {
    fn into_response(self) -> Response {
        let message = match self {
            ForwardError::Timeout(_) => "Upstream timed out",
            ForwardError::Upstream(_) => "Upstream request failed",
            ForwardError::Body(_) => "Invalid request body",
            ForwardError::PayloadTooLarge => "Payload too large",
            ForwardError::InvalidUrl(_) => "Invalid request target",
        };
        (self.status(), message).into_response()
    }
}

/// Builds and sends outbound requests.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: reqwest::Client,
    origin: Url,
    upstream_scheme: String,
    deployment_header: HeaderName,
    upstream_timeout: Duration,
}

impl Forwarder {
    pub fn new(
        client: reqwest::Client,
        forwarder: &ForwarderConfig,
        timeouts: &TimeoutConfig,
    ) -> Result<Self, BuildError> {
        let origin = forwarder.origin.as_deref().ok_or(BuildError::MissingOrigin)?;
        let origin = Url::parse(origin).map_err(BuildError::InvalidOrigin)?;
        let deployment_header = HeaderName::from_bytes(forwarder.deployment_header.as_bytes())
            .map_err(|_| BuildError::InvalidHeader(forwarder.deployment_header.clone()))?;

        Ok(Self {
            client,
            origin,
            upstream_scheme: forwarder.upstream_scheme.clone(),
            deployment_header,
            upstream_timeout: Duration::from_secs(timeouts.upstream_secs),
        })
    }

    pub fn deployment_header(&self) -> &HeaderName {
        &self.deployment_header
    }

    /// Where this request goes when nothing is rewritten: the configured
    /// origin, same path and query.
    pub fn original_url(&self, parts: &Parts) -> Result<Url, ForwardError> {
        Ok(Url::parse(&format!(
            "{}://{}{}",
            self.origin.scheme(),
            authority_of(&self.origin),
            path_and_query(parts)
        ))?)
    }

    /// Same path and query, new host.
    pub fn rewritten_url(&self, parts: &Parts, host: &Authority) -> Result<Url, ForwardError> {
        Ok(Url::parse(&format!(
            "{}://{}{}",
            self.upstream_scheme,
            host,
            path_and_query(parts)
        ))?)
    }

    /// Build the outbound request. `target` of `None` means pass-through.
    pub fn build(
        &self,
        parts: &Parts,
        body: Bytes,
        target: Option<&Authority>,
    ) -> Result<reqwest::Request, ForwardError> {
        let mut headers = parts.headers.clone();
        strip_hop_by_hop(&mut headers);

        let url = match target {
            Some(host) => {
                // Host is re-derived from the new URL.
                headers.remove(header::HOST);
                headers.remove(&self.deployment_header);
                self.rewritten_url(parts, host)?
            }
            None => self.original_url(parts)?,
        };

        let mut builder = self
            .client
            .request(parts.method.clone(), url)
            .timeout(self.upstream_timeout);
        if carries_body(&parts.method) {
            builder = builder.body(body);
        } else {
            headers.remove(header::CONTENT_LENGTH);
        }

        builder.headers(headers).build().map_err(ForwardError::Upstream)
    }

    /// Send a built request once and stream the response back.
    pub async fn dispatch(&self, request: reqwest::Request) -> Result<Response, ForwardError> {
        let upstream = self.client.execute(request).await.map_err(|e| {
            if e.is_timeout() {
                ForwardError::Timeout(e)
            } else {
                ForwardError::Upstream(e)
            }
        })?;

        let status = upstream.status();
        let mut headers = upstream.headers().clone();
        strip_hop_by_hop(&mut headers);

        let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Ok(response)
    }

    /// Build and dispatch in one step.
    pub async fn forward(
        &self,
        parts: &Parts,
        body: Body,
        target: Option<&Authority>,
    ) -> Result<Response, ForwardError> {
        // Size is bounded by the body limit layer.
        let body = if carries_body(&parts.method) {
            axum::body::to_bytes(body, usize::MAX)
                .await
                .map_err(ForwardError::from_body)?
        } else {
            Bytes::new()
        };
        let request = self.build(parts, body, target)?;
        tracing::debug!(
            method = %request.method(),
            url = %request.url(),
            rewritten = target.is_some(),
            "Dispatching upstream"
        );
        self.dispatch(request).await
    }
}

/// GET and HEAD requests are sent without a body.
pub fn carries_body(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD)
}

fn path_and_query(parts: &Parts) -> &str {
    parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/")
}

fn authority_of(url: &Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn forwarder(origin: &str) -> Forwarder {
        let config = ForwarderConfig {
            origin: Some(origin.into()),
            ..ForwarderConfig::default()
        };
        Forwarder::new(reqwest::Client::new(), &config, &TimeoutConfig::default()).unwrap()
    }

    fn request(method: Method, uri: &str) -> Parts {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("host", "app.example")
            .header("user-agent", "Mozilla/5.0 (iPhone)")
            .header("x-deployment-id", "dep-42")
            .header("connection", "keep-alive")
            .header("content-length", "4")
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    #[test]
    fn rewrite_replaces_host_and_strips_deployment_header() {
        let fwd = forwarder("https://app.example");
        let parts = request(Method::GET, "/a/b?c=d");
        let host: Authority = "m.example.org".parse().unwrap();

        let req = fwd.build(&parts, Bytes::new(), Some(&host)).unwrap();
        assert_eq!(req.method(), Method::GET);
        assert_eq!(req.url().as_str(), "https://m.example.org/a/b?c=d");
        assert!(req.headers().get("x-deployment-id").is_none());
        assert!(req.headers().get(header::HOST).is_none());
        assert!(req.headers().get(header::CONNECTION).is_none());
        assert!(req.headers().get(header::CONTENT_LENGTH).is_none());
        assert_eq!(req.headers().get(header::USER_AGENT).unwrap(), "Mozilla/5.0 (iPhone)");
        assert!(req.body().is_none());
        assert_eq!(req.timeout(), Some(&Duration::from_secs(25)));
    }

    #[test]
    fn pass_through_keeps_destination_and_headers() {
        let fwd = forwarder("https://app.example");
        let parts = request(Method::GET, "/");

        let req = fwd.build(&parts, Bytes::new(), None).unwrap();
        assert_eq!(req.url().as_str(), "https://app.example/");
        assert_eq!(req.headers().get(header::HOST).unwrap(), "app.example");
        assert_eq!(req.headers().get("x-deployment-id").unwrap(), "dep-42");
    }

    #[test]
    fn pass_through_ignores_the_client_host() {
        let fwd = forwarder("http://127.0.0.1:3000");
        let mut parts = request(Method::GET, "/x?y=1");
        parts.headers.insert(header::HOST, "10.0.0.7:8080".parse().unwrap());

        let req = fwd.build(&parts, Bytes::new(), None).unwrap();
        assert_eq!(req.url().as_str(), "http://127.0.0.1:3000/x?y=1");
        assert_eq!(req.headers().get(header::HOST).unwrap(), "10.0.0.7:8080");
    }

    #[test]
    fn absolute_form_target_does_not_pick_the_destination() {
        let fwd = forwarder("http://127.0.0.1:3000");
        let (parts, _) = Request::builder()
            .uri("http://internal.example:9000/admin")
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(
            fwd.original_url(&parts).unwrap().as_str(),
            "http://127.0.0.1:3000/admin"
        );
    }

    #[test]
    fn post_keeps_its_body() {
        let fwd = forwarder("https://app.example");
        let parts = request(Method::POST, "/submit");
        let host: Authority = "d.example.org".parse().unwrap();

        let req = fwd.build(&parts, Bytes::from_static(b"data"), Some(&host)).unwrap();
        assert_eq!(req.method(), Method::POST);
        assert!(req.body().is_some());
        assert_eq!(req.headers().get(header::CONTENT_LENGTH).unwrap(), "4");
    }

    #[test]
    fn missing_origin_is_a_build_error() {
        let err = Forwarder::new(
            reqwest::Client::new(),
            &ForwarderConfig::default(),
            &TimeoutConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::MissingOrigin));
    }

    #[test]
    fn invalid_deployment_header_is_a_build_error() {
        let config = ForwarderConfig {
            origin: Some("https://app.example".into()),
            deployment_header: "bad header".into(),
            ..ForwarderConfig::default()
        };
        let err = Forwarder::new(reqwest::Client::new(), &config, &TimeoutConfig::default())
            .unwrap_err();
        assert!(matches!(err, BuildError::InvalidHeader(name) if name == "bad header"));
    }

    #[tokio::test]
    async fn oversized_body_is_payload_too_large() {
        let fwd = forwarder("http://127.0.0.1:3000");
        let parts = request(Method::POST, "/upload");
        let body = Body::new(http_body_util::Limited::new(Body::from(vec![b'x'; 64]), 16));

        let err = fwd.forward(&parts, body, None).await.unwrap_err();
        assert!(matches!(err, ForwardError::PayloadTooLarge));
        assert_eq!(err.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn carries_body_excludes_get_and_head() {
        assert!(!carries_body(&Method::GET));
        assert!(!carries_body(&Method::HEAD));
        assert!(carries_body(&Method::POST));
        assert!(carries_body(&Method::PUT));
        assert!(carries_body(&Method::DELETE));
    }
}
