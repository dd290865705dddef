#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use sparkfluence_providers::ProviderConfig;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tower::ServiceExt;

use sparkfluence_api::config::ServerConfig;
use sparkfluence_api::router::build_app_router;
use sparkfluence_api::state::AppState;

/// Build a test `ServerConfig` with safe defaults.
///
/// Allows any origin (the production default) and a 30-second request
/// timeout.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["*".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
    }
}

/// Application state with no provider credentials configured.
pub fn test_state(pool: PgPool) -> AppState {
    test_state_with(pool, ProviderConfig::default())
}

pub fn test_state_with(pool: PgPool, providers: ProviderConfig) -> AppState {
    AppState {
        pool,
        config: Arc::new(test_config()),
        providers: Arc::new(providers),
        http: reqwest::Client::new(),
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool.
pub fn build_test_app(pool: PgPool) -> Router {
    build_app_router(test_state(pool), &test_config())
}

/// Router with a VEO key configured against an unreachable gateway.
///
/// For paths that must settle before any provider call.
pub fn build_veo_test_app(pool: PgPool) -> Router {
    let providers = ProviderConfig {
        veo_api_key: Some("test-key".into()),
        veo_base_url: "http://127.0.0.1:1".into(),
        ..ProviderConfig::default()
    };
    build_app_router(test_state_with(pool, providers), &test_config())
}

/// Router over a pool that never connects.
///
/// For requests rejected before any query runs (body parsing, missing
/// fields, missing credentials).
pub fn build_offline_app() -> Router {
    let pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_secs(2))
        .connect_lazy("postgres://offline@127.0.0.1:1/unused")
        .expect("lazy pool");
    build_test_app(pool)
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Send a GET request to the app.
pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send a request with a raw (possibly malformed) body.
pub async fn send_raw(app: Router, method: Method, uri: &str, body: &str) -> Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_raw(app: Router, uri: &str, body: &str) -> Response {
    send_raw(app, Method::POST, uri, body).await
}

/// POST a JSON value.
pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    post_raw(app, uri, &body.to_string()).await
}

/// PUT a JSON value.
pub async fn put_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send_raw(app, Method::PUT, uri, &body.to_string()).await
}

pub async fn delete(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}
