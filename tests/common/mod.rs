//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use content_gateway::backend::BackendClient;
use content_gateway::config::GatewayConfig;
use content_gateway::http::{build_router, AppState};
use content_gateway::licenses::{LicenseResolver, MemoryLicenseCache};
use content_gateway::store::{MemoryNoteStore, NoteStore};

/// Nothing listens here; used when a test never reaches the content API.
pub const UNUSED_BACKEND: &str = "http://127.0.0.1:9";

/// A router wired to in-process stores.
pub struct TestGateway {
    pub router: Router,
    pub notes: Arc<MemoryNoteStore>,
    pub cache: Arc<MemoryLicenseCache>,
}

/// Default configuration pointed at `backend_url`.
pub fn config_for(backend_url: &str) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.backend.base_url = backend_url.to_string();
    config.observability.metrics_enabled = false;
    config.store.connect_timeout_secs = 1;
    config
}

pub async fn gateway(config: GatewayConfig) -> TestGateway {
    let backend = Arc::new(
        BackendClient::new(&config.backend, Duration::from_secs(5)).expect("backend client"),
    );
    let cache = Arc::new(MemoryLicenseCache::new());
    let resolver = Arc::new(LicenseResolver::new(
        cache.clone(),
        backend.clone(),
        &config.licenses,
    ));
    let notes = Arc::new(MemoryNoteStore::new());
    notes.connect().await.expect("memory store connects");

    let state = AppState::new(config.clone(), backend, notes.clone(), resolver);
    TestGateway {
        router: build_router(&config, state),
        notes,
        cache,
    }
}

/// A response reduced to what tests look at.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub async fn send(router: &Router, request: Request<Body>) -> TestResponse {
    let response = router.clone().oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    TestResponse {
        status,
        headers,
        body,
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn json(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}
