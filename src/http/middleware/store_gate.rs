//! Storage connectivity gate.
//!
//! Lets a request through when the note store is connected. Otherwise
//! tries one reconnect; if that fails the request is answered with a
//! server error and never reaches its controller.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::http::request::RequestContext;
use crate::http::response::ApiError;
use crate::observability::metrics;
use crate::store::NoteStore;

/// State for the connectivity gate.
#[derive(Clone)]
pub struct StoreGate {
    pub store: Arc<dyn NoteStore>,
    pub connect_timeout: Duration,
}

pub async fn store_gate_middleware(
    State(gate): State<StoreGate>,
    req: Request,
    next: Next,
) -> Response {
    if gate.store.is_connected() {
        return next.run(req).await;
    }

    let ctx = RequestContext::from_request(&req);
    tracing::warn!(msgid = %ctx.msgid, "Note store disconnected, reconnecting");

    let reconnect = match tokio::time::timeout(gate.connect_timeout, gate.store.connect()).await {
        Ok(result) => result.map_err(|e| e.to_string()),
        Err(_) => Err(format!("connect timed out after {:?}", gate.connect_timeout)),
    };

    match reconnect {
        Ok(()) => {
            metrics::record_store_reconnect("ok");
            tracing::info!(msgid = %ctx.msgid, "Note store reconnected");
            next.run(req).await
        }
        Err(reason) => {
            metrics::record_store_reconnect("error");
            tracing::error!(msgid = %ctx.msgid, reason = %reason, "Note store reconnect failed");
            ctx.respond(Err(ApiError::store_unavailable()))
        }
    }
}
