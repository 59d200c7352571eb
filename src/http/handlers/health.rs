use axum::{extract::State, response::Response, Extension};
use serde_json::json;

use crate::http::request::RequestContext;
use crate::http::server::AppState;

pub async fn health(State(state): State<AppState>, Extension(ctx): Extension<RequestContext>) -> Response {
    let store_connected = state.notes.is_connected();
    ctx.respond(Ok(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "healthy": store_connected,
        "checks": [
            { "name": "note store", "healthy": store_connected }
        ]
    })))
}
