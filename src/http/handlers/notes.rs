//! Note controllers. All routes here sit behind the store connectivity gate.

use axum::{
    body::Bytes,
    extract::{Path, State},
    response::Response,
    Extension,
};
use serde_json::{json, Value};

use crate::http::handlers::{has_fields, parse_body, request_object};
use crate::http::request::RequestContext;
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::store::{NewNote, NoteFilter, NotePatch};

const ERR_CREATE_NOTE_FIELDS_MISSING: &str = "ERR_CREATE_NOTE_FIELDS_MISSING";
const ERR_UPDATE_NOTE_FIELDS_MISSING: &str = "ERR_UPDATE_NOTE_FIELDS_MISSING";
const ERR_SEARCH_NOTE_FIELDS_MISSING: &str = "ERR_SEARCH_NOTE_FIELDS_MISSING";

pub async fn create(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    body: Bytes,
) -> Response {
    let outcome = create_note(&state, &body).await;
    ctx.respond(outcome)
}

async fn create_note(state: &AppState, body: &[u8]) -> Result<Value, ApiError> {
    let missing = || ApiError::client(ERR_CREATE_NOTE_FIELDS_MISSING, "Required fields for create note are missing");

    let payload = parse_body(body)?;
    let note = request_object(&payload, "note").ok_or_else(missing)?;
    let linked = has_fields(note, &["courseId"]) || has_fields(note, &["contentId"]);
    if !has_fields(note, &["userId", "title", "note"]) || !linked {
        return Err(missing());
    }
    let note: NewNote = serde_json::from_value(Value::Object(note.clone())).map_err(|_| missing())?;

    let created = state.notes.create(note).await?;
    tracing::info!(note_id = %created.id, user_id = %created.user_id, "Note created");
    Ok(json!({ "id": created.id }))
}

pub async fn read(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(ctx): Extension<RequestContext>,
) -> Response {
    let outcome = match state.notes.get(&id).await {
        Ok(Some(note)) => Ok(json!({ "note": note })),
        Ok(None) => Err(ApiError::not_found("ERR_NOTE_NOT_FOUND", "Note not found")),
        Err(e) => Err(e.into()),
    };
    ctx.respond(outcome)
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(ctx): Extension<RequestContext>,
    body: Bytes,
) -> Response {
    let outcome = update_note(&state, &id, &body).await;
    ctx.respond(outcome)
}

async fn update_note(state: &AppState, id: &str, body: &[u8]) -> Result<Value, ApiError> {
    let missing = || ApiError::client(ERR_UPDATE_NOTE_FIELDS_MISSING, "Required fields for update note are missing");

    let payload = parse_body(body)?;
    let note = request_object(&payload, "note").ok_or_else(missing)?;
    let patch: NotePatch = serde_json::from_value(Value::Object(note.clone())).map_err(|_| missing())?;

    let updated = state.notes.update(id, patch).await?;
    Ok(json!({ "id": updated.id }))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(ctx): Extension<RequestContext>,
) -> Response {
    let outcome = match state.notes.delete(&id).await {
        Ok(()) => Ok(json!({ "id": id })),
        Err(e) => Err(e.into()),
    };
    ctx.respond(outcome)
}

pub async fn search(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    body: Bytes,
) -> Response {
    let outcome = search_notes(&state, &body).await;
    ctx.respond(outcome)
}

async fn search_notes(state: &AppState, body: &[u8]) -> Result<Value, ApiError> {
    let missing = || ApiError::client(ERR_SEARCH_NOTE_FIELDS_MISSING, "Required fields for search note are missing");

    let payload = parse_body(body)?;
    let request = payload.get("request").and_then(Value::as_object).ok_or_else(missing)?;
    let filter: NoteFilter = match request.get("filters") {
        Some(filters) => serde_json::from_value(filters.clone()).map_err(|_| missing())?,
        None => NoteFilter::default(),
    };

    let notes = state.notes.search(&filter).await?;
    Ok(json!({ "count": notes.len(), "note": notes }))
}
