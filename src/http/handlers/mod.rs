//! Controllers: validate the request, delegate, shape the result.

pub mod content;
pub mod health;
pub mod notes;

use serde_json::{Map, Value};

use crate::http::response::ApiError;

pub const ERR_INVALID_REQUEST_BODY: &str = "ERR_INVALID_REQUEST_BODY";

/// Parse a JSON request body.
pub(crate) fn parse_body(bytes: &[u8]) -> Result<Value, ApiError> {
    serde_json::from_slice(bytes)
        .map_err(|_| ApiError::client(ERR_INVALID_REQUEST_BODY, "Request body must be valid JSON"))
}

/// `body.request.<key>` as an object.
pub(crate) fn request_object<'a>(body: &'a Value, key: &str) -> Option<&'a Map<String, Value>> {
    body.get("request")?.get(key)?.as_object()
}

/// True when every field is present as a non-empty string.
pub(crate) fn has_fields(object: &Map<String, Value>, fields: &[&str]) -> bool {
    fields.iter().all(|field| {
        object
            .get(*field)
            .and_then(Value::as_str)
            .is_some_and(|v| !v.is_empty())
    })
}
