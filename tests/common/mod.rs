//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tokio::net::{TcpListener, TcpStream};

use edge_router::{EdgeConfig, EdgeServer, Shutdown};

pub const IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15";
pub const DESKTOP: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 Chrome/120.0";

/// Serve `app` on an ephemeral local port.
pub async fn spawn(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// An address nothing listens on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// What an echo origin saw.
#[derive(Debug, Deserialize)]
pub struct Echo {
    pub origin: String,
    pub method: String,
    pub path: String,
    pub host: Option<String>,
    pub headers: HashMap<String, String>,
    pub body: String,
}

async fn echo(State(name): State<&'static str>, request: Request<Body>) -> impl IntoResponse {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, 1024 * 1024).await.unwrap_or_default();
    let headers: HashMap<String, String> = parts
        .headers
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_string()))
        .collect();

    (
        [("x-origin", name)],
        Json(json!({
            "origin": name,
            "method": parts.method.as_str(),
            "path": parts.uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/"),
            "host": parts.headers.get(header::HOST).and_then(|h| h.to_str().ok()),
            "headers": headers,
            "body": String::from_utf8_lossy(&body),
        })),
    )
}

/// Origin that echoes every request back as JSON.
pub async fn echo_origin(name: &'static str) -> SocketAddr {
    spawn(Router::new().fallback(echo).with_state(name)).await
}

/// Behaviour of a mock `/api/data` endpoint.
#[derive(Clone)]
pub struct ConfigService {
    pub status: StatusCode,
    pub body: String,
    pub delay: Duration,
    pub hits: Arc<AtomicUsize>,
    pub hosts_seen: Arc<Mutex<Vec<String>>>,
}

impl ConfigService {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            delay: Duration::ZERO,
            hits: Arc::new(AtomicUsize::new(0)),
            hosts_seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Document pointing each device class at a local origin.
    pub fn hosts(mobile: SocketAddr, desktop: SocketAddr) -> Self {
        Self::new(
            StatusCode::OK,
            json!({
                "message": "Data from API route",
                "hosts": { "mobile": mobile.to_string(), "desktop": desktop.to_string() },
                "config": { "redirectEnabled": true, "cacheTime": 300 }
            })
            .to_string(),
        )
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn config_data(State(service): State<ConfigService>, request: Request<Body>) -> impl IntoResponse {
    service.hits.fetch_add(1, Ordering::SeqCst);
    if let Some(host) = request.headers().get(header::HOST).and_then(|h| h.to_str().ok()) {
        service.hosts_seen.lock().unwrap().push(host.to_string());
    }
    tokio::time::sleep(service.delay).await;
    (
        service.status,
        [(header::CONTENT_TYPE, "application/json")],
        service.body.clone(),
    )
}

async fn method_not_allowed() -> impl IntoResponse {
    (StatusCode::METHOD_NOT_ALLOWED, [(header::ALLOW, "GET")])
}

/// Pass-through origin that also serves `/api/data`; everything else echoes
/// with origin name `"passthrough"`.
pub async fn origin_with_config(service: ConfigService) -> SocketAddr {
    let config = Router::new()
        .route("/api/data", get(config_data).fallback(method_not_allowed))
        .with_state(service);
    let app = config.merge(Router::new().fallback(echo).with_state("passthrough"));
    spawn(app).await
}

/// Origin that waits `delay` before answering.
pub async fn slow_origin(delay: Duration) -> SocketAddr {
    let app = Router::new().fallback(move || async move {
        tokio::time::sleep(delay).await;
        "late"
    });
    spawn(app).await
}

/// TCP front for `backend` that drops every connection whose request line
/// targets `/api/data`; everything else is relayed untouched.
pub async fn drop_config_lookups(backend: SocketAddr) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut inbound, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut head = [0u8; 64];
                let n = inbound.peek(&mut head).await.unwrap_or(0);
                if head[..n].windows(9).any(|w| w == b"/api/data") {
                    return;
                }
                if let Ok(mut outbound) = TcpStream::connect(backend).await {
                    let _ = tokio::io::copy_bidirectional(&mut inbound, &mut outbound).await;
                }
            });
        }
    });
    addr
}

/// Start the edge router on an ephemeral port.
pub async fn start_edge(mut config: EdgeConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    config.listener.bind_address = addr.to_string();

    let shutdown = Shutdown::new();
    let server = EdgeServer::new(config).expect("edge server should build");
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });
    (addr, shutdown)
}

/// Client that never follows redirects and ignores system proxies.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap()
}

/// Edge config with pass-through traffic going to `origin` over plain HTTP.
pub fn edge_config(origin: SocketAddr) -> EdgeConfig {
    let mut config = EdgeConfig::default();
    config.forwarder.origin = Some(format!("http://{}", origin));
    config.forwarder.upstream_scheme = "http".into();
    config
}
