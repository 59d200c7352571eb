//! Response envelope rendering.
//!
//! Every response leaving the gateway has the same shape:
//!
//! ```text
//! { id, ver, ts, params: { resmsgid, msgid, status, err, errmsg }, responseCode, result }
//! ```
//!
//! Upstream failures keep the upstream status, code and message so callers
//! see what the content API said.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::backend::BackendError;
use crate::http::request::RequestContext;
use crate::store::StoreError;

/// Protocol version reported in every envelope.
pub const API_VERSION: &str = "1.0";

pub const ERR_DB_CONNECTION_FAILED: &str = "ERR_DB_CONNECTION_FAILED";
pub const ERR_DB_CONNECTION_FAILED_MSG: &str = "Unable to connect to the note store";

/// Outcome category carried in `responseCode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseCode {
    Ok,
    ClientError,
    ResourceNotFound,
    ServerError,
}

impl ResponseCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseCode::Ok => "OK",
            ResponseCode::ClientError => "CLIENT_ERROR",
            ResponseCode::ResourceNotFound => "RESOURCE_NOT_FOUND",
            ResponseCode::ServerError => "SERVER_ERROR",
        }
    }

    pub fn from_status(status: StatusCode) -> Self {
        if status == StatusCode::NOT_FOUND {
            ResponseCode::ResourceNotFound
        } else if status.is_client_error() {
            ResponseCode::ClientError
        } else if status.is_server_error() {
            ResponseCode::ServerError
        } else {
            ResponseCode::Ok
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EnvelopeParams {
    pub resmsgid: String,
    pub msgid: String,
    pub status: &'static str,
    pub err: Option<String>,
    pub errmsg: Option<String>,
}

/// A rendered gateway response.
#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub id: String,
    pub ver: &'static str,
    pub ts: String,
    pub params: EnvelopeParams,
    #[serde(rename = "responseCode")]
    pub response_code: String,
    pub result: Value,
    #[serde(skip)]
    pub status: StatusCode,
}

impl ApiResponse {
    pub fn success(ctx: &RequestContext, result: Value) -> Self {
        Self {
            id: ctx.api_id.clone(),
            ver: API_VERSION,
            ts: timestamp(),
            params: EnvelopeParams {
                resmsgid: Uuid::new_v4().to_string(),
                msgid: ctx.msgid.clone(),
                status: "successful",
                err: None,
                errmsg: None,
            },
            response_code: ResponseCode::Ok.as_str().to_string(),
            result,
            status: StatusCode::OK,
        }
    }

    pub fn failure(ctx: &RequestContext, error: ApiError) -> Self {
        Self {
            id: ctx.api_id.clone(),
            ver: API_VERSION,
            ts: timestamp(),
            params: EnvelopeParams {
                resmsgid: Uuid::new_v4().to_string(),
                msgid: ctx.msgid.clone(),
                status: "failed",
                err: Some(error.err),
                errmsg: Some(error.errmsg),
            },
            response_code: error.response_code,
            result: error.result,
            status: error.status,
        }
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// A failed request, before it is rendered into an envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub status: StatusCode,
    pub response_code: String,
    pub err: String,
    pub errmsg: String,
    pub result: Value,
}

impl ApiError {
    pub fn new(status: StatusCode, err: &str, errmsg: &str) -> Self {
        Self {
            status,
            response_code: ResponseCode::from_status(status).as_str().to_string(),
            err: err.to_string(),
            errmsg: errmsg.to_string(),
            result: json!({}),
        }
    }

    pub fn client(err: &str, errmsg: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, err, errmsg)
    }

    pub fn not_found(err: &str, errmsg: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, err, errmsg)
    }

    pub fn server(err: &str, errmsg: &str) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err, errmsg)
    }

    pub fn store_unavailable() -> Self {
        Self::server(ERR_DB_CONNECTION_FAILED, ERR_DB_CONNECTION_FAILED_MSG)
    }
}

impl From<BackendError> for ApiError {
    fn from(error: BackendError) -> Self {
        match error {
            BackendError::Upstream { status, envelope } => {
                let status =
                    StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                let response_code = if envelope.response_code.is_empty() {
                    ResponseCode::from_status(status).as_str().to_string()
                } else {
                    envelope.response_code
                };
                Self {
                    status,
                    response_code,
                    err: envelope.params.err.unwrap_or_else(|| "ERR_UPSTREAM".into()),
                    errmsg: envelope
                        .params
                        .errmsg
                        .unwrap_or_else(|| "Content service request failed".into()),
                    result: Value::Object(envelope.result),
                }
            }
            BackendError::InvalidId(id) => {
                tracing::debug!(id = %id, "Rejected content id");
                Self::client("ERR_INVALID_CONTENT_ID", "Content id is not valid")
            }
            other => {
                tracing::error!(error = %other, "Content service unavailable");
                Self::server("ERR_UPSTREAM_UNAVAILABLE", "Content service is unavailable")
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Unavailable(reason) => {
                tracing::error!(reason = %reason, "Note store call failed");
                Self::store_unavailable()
            }
            StoreError::NotFound(_) => Self::not_found("ERR_NOTE_NOT_FOUND", "Note not found"),
        }
    }
}
