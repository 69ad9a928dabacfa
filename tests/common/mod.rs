//! Shared helpers for the HTTP integration tests

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Method, Request, Response},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use lectern_server::{
    config::{AppConfig, StorageBackend},
    repository::Repository,
    AppState,
};

/// Router over a fresh in-memory catalog with default policy
pub fn build_test_app() -> Router {
    build_app_with(AppConfig::default())
}

/// Router over a fresh in-memory catalog; `storage` is reported as memory
pub fn build_app_with(mut config: AppConfig) -> Router {
    config.catalog.storage = StorageBackend::Memory;
    lectern_server::api::router(AppState::new(config, Repository::in_memory()))
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// `Location` of a redirect
pub fn location(response: &Response<Body>) -> String {
    response.headers()["location"].to_str().unwrap().to_string()
}

/// Id at the end of an entity url
pub fn id_of(url: &str) -> String {
    url.rsplit('/').next().unwrap_or_default().to_string()
}
