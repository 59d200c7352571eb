//! Content controllers. Each one checks field presence, then forwards to
//! the upstream content API and returns its `result`.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    response::Response,
    Extension,
};
use serde::Deserialize;
use serde_json::Value;

use crate::http::filters::apply_search_filters;
use crate::http::handlers::{has_fields, parse_body, request_object};
use crate::http::request::RequestContext;
use crate::http::response::ApiError;
use crate::http::server::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ReadParams {
    pub fields: Option<String>,
}

pub async fn search(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    body: Bytes,
) -> Response {
    let outcome = search_content(&state, &ctx, &body).await;
    ctx.respond(outcome)
}

async fn search_content(state: &AppState, ctx: &RequestContext, body: &[u8]) -> Result<Value, ApiError> {
    let mut payload = parse_body(body)?;
    let request = payload
        .get_mut("request")
        .and_then(Value::as_object_mut)
        .ok_or_else(|| {
            ApiError::client(
                "ERR_CONTENT_SEARCH_FIELDS_MISSING",
                "Required fields for search content are missing",
            )
        })?;
    apply_search_filters(request, &state.filters.load());

    let envelope = state.backend.search(&payload, &ctx.msgid).await?;
    Ok(Value::Object(envelope.result))
}

pub async fn read(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<ReadParams>,
    Extension(ctx): Extension<RequestContext>,
) -> Response {
    let outcome = state
        .backend
        .get_content(&id, params.fields.as_deref(), &ctx.msgid)
        .await
        .map(|envelope| Value::Object(envelope.result))
        .map_err(ApiError::from);
    ctx.respond(outcome)
}

pub async fn create(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    body: Bytes,
) -> Response {
    let outcome = create_content(&state, &ctx, &body).await;
    ctx.respond(outcome)
}

async fn create_content(state: &AppState, ctx: &RequestContext, body: &[u8]) -> Result<Value, ApiError> {
    let payload = parse_body(body)?;
    let valid = request_object(&payload, "content")
        .is_some_and(|content| has_fields(content, &["name", "mimeType", "contentType"]));
    if !valid {
        return Err(ApiError::client(
            "ERR_CONTENT_CREATE_FIELDS_MISSING",
            "Required fields for create content are missing",
        ));
    }

    let envelope = state.backend.create_content(&payload, &ctx.msgid).await?;
    tracing::info!(msgid = %ctx.msgid, node_id = ?envelope.result.get("node_id"), "Content created");
    Ok(Value::Object(envelope.result))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(ctx): Extension<RequestContext>,
    body: Bytes,
) -> Response {
    let outcome = update_content(&state, &ctx, &id, &body).await;
    ctx.respond(outcome)
}

async fn update_content(
    state: &AppState,
    ctx: &RequestContext,
    id: &str,
    body: &[u8],
) -> Result<Value, ApiError> {
    let payload = parse_body(body)?;
    if request_object(&payload, "content").is_none() {
        return Err(ApiError::client(
            "ERR_CONTENT_UPDATE_FIELDS_MISSING",
            "Required fields for update content are missing",
        ));
    }

    let envelope = state.backend.update_content(id, &payload, &ctx.msgid).await?;
    Ok(Value::Object(envelope.result))
}

pub async fn publish(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(ctx): Extension<RequestContext>,
    body: Bytes,
) -> Response {
    let outcome = publish_content(&state, &ctx, &id, &body).await;
    ctx.respond(outcome)
}

async fn publish_content(
    state: &AppState,
    ctx: &RequestContext,
    id: &str,
    body: &[u8],
) -> Result<Value, ApiError> {
    let payload = parse_body(body)?;
    let valid = request_object(&payload, "content")
        .is_some_and(|content| has_fields(content, &["lastPublishedBy"]));
    if !valid {
        return Err(ApiError::client(
            "ERR_CONTENT_PUBLISH_FIELDS_MISSING",
            "Required fields for publish content are missing",
        ));
    }

    let envelope = state.backend.publish_content(id, &payload, &ctx.msgid).await?;
    tracing::info!(msgid = %ctx.msgid, content_id = %id, "Content publish requested");
    Ok(Value::Object(envelope.result))
}

pub async fn retire(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(ctx): Extension<RequestContext>,
) -> Response {
    let outcome = state
        .backend
        .retire_content(&id, &ctx.msgid)
        .await
        .map(|envelope| Value::Object(envelope.result))
        .map_err(ApiError::from);
    ctx.respond(outcome)
}
