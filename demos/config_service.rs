//! Minimal configuration endpoint for local testing.
//!
//! `cargo run --example config_service` then point a dynamic site's
//! `forwarder.origin` at http://127.0.0.1:8081.

use std::net::SocketAddr;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;

async fn data() -> impl IntoResponse {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();

    Json(json!({
        "message": "Data from API route",
        "timestamp": timestamp,
        "hosts": {
            "mobile": "m.example.org",
            "desktop": "d.example.org"
        },
        "config": {
            "redirectEnabled": true,
            "cacheTime": 300
        }
    }))
}

async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "GET")],
        "Method Not Allowed",
    )
}

#[tokio::main]
async fn main() {
    let app = Router::new()
        .route("/api/data", get(data).fallback(method_not_allowed))
        .route("/", get(|| async { "Pretend origin is up" }));

    let addr = SocketAddr::from(([127, 0, 0, 1], 8081));
    println!("Configuration service listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
