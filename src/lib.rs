//! StartupMatch: library crate behind the `startupmatch` binary.
//!
//! Exposes the application state and router so integration tests in
//! `tests/` can drive the full HTTP and WebSocket surface.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderName, HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod errors;
pub mod metrics;
pub mod models;
pub mod moderation;
pub mod relay;
pub mod store;

use auth::session::SessionKeys;
use relay::RelayHub;
use store::upload_store::UploadStore;
use store::ContentStore;

/// Shared application state passed to handlers and extractors.
pub struct AppState {
    pub store: Arc<dyn ContentStore>,
    pub sessions: SessionKeys,
    pub uploads: UploadStore,
    pub relay: RelayHub,
    pub config: config::Config,
}

impl AppState {
    pub fn new(config: config::Config, store: Arc<dyn ContentStore>) -> anyhow::Result<Self> {
        let uploads = UploadStore::from_url(&config.upload_store_url, config.max_upload_bytes)?;
        Ok(Self {
            store,
            sessions: SessionKeys::new(&config.session_secret),
            uploads,
            relay: RelayHub::new(),
            config,
        })
    }
}

/// Assemble the full application: REST API, relay, uploads, health and
/// metrics, wrapped in tracing, CORS and response-header middleware.
pub fn app(state: Arc<AppState>) -> Router {
    // two image parts plus the text fields of a startup form
    let body_limit = state.config.max_upload_bytes * 2 + 1024 * 1024;
    let cors = cors_layer(&state.config.cors_origin);

    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/metrics", get(metrics_handler))
        .route("/ws", get(relay::ws_handler))
        .route("/uploads/*key", get(api::uploads::get_upload))
        .nest("/api", api::api_router())
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(axum::middleware::from_fn(security_headers_middleware))
}

async fn metrics_handler() -> String {
    metrics::encode_metrics()
}

fn cors_layer(origin: &str) -> CorsLayer {
    let allowed = origin.to_string();
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin, _| {
            let origin_str = origin.to_str().unwrap_or("");
            origin_str == allowed
                || origin_str.starts_with("http://localhost:")
                || origin_str.starts_with("http://127.0.0.1:")
        }))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        // NOTE: Cannot use AllowHeaders::any() with allow_credentials(true)
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("authorization"),
            HeaderName::from_static("x-request-id"),
        ])
        .allow_credentials(true)
}

/// Middleware: injects a unique X-Request-Id into every response.
async fn request_id_middleware(
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let req_id = uuid::Uuid::new_v4().to_string();
    let mut resp = next.run(req).await;
    if let Ok(val) = HeaderValue::from_str(&req_id) {
        resp.headers_mut().insert("x-request-id", val);
    }
    resp
}

/// Middleware: injects security headers into every response.
async fn security_headers_middleware(
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let mut resp = next.run(req).await;
    let headers = resp.headers_mut();

    headers.insert("X-Content-Type-Options", HeaderValue::from_static("nosniff"));
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert("Referrer-Policy", HeaderValue::from_static("no-referrer"));

    // Uploads set their own caching
    if !headers.contains_key("Cache-Control") {
        headers.insert("Cache-Control", HeaderValue::from_static("no-store"));
    }

    headers.remove("Server");

    resp
}
