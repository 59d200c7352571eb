//! Upstream response envelope and error definitions.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// `responseCode` reported by the upstream on success.
pub const RESPONSE_OK: &str = "OK";

/// Status block of an upstream envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseParams {
    pub resmsgid: Option<String>,
    pub msgid: Option<String>,
    pub status: Option<String>,
    pub err: Option<String>,
    pub errmsg: Option<String>,
}

/// Envelope returned by every upstream endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseEnvelope {
    pub id: Option<String>,
    pub ver: Option<String>,
    #[serde(rename = "responseCode")]
    pub response_code: String,
    pub params: ResponseParams,
    pub result: Map<String, Value>,
    /// HTTP status of the upstream response. Not part of the wire format.
    #[serde(skip)]
    pub status_code: u16,
}

impl ResponseEnvelope {
    pub fn is_ok(&self) -> bool {
        self.response_code == RESPONSE_OK
    }
}

/// Errors that can occur while talking to the upstream.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Connection, timeout or protocol failure.
    #[error("upstream transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Upstream answered with a failure status or a non-OK `responseCode`.
    #[error("upstream returned {status} ({})", .envelope.response_code)]
    Upstream {
        status: u16,
        envelope: Box<ResponseEnvelope>,
    },

    /// Upstream body was not a response envelope.
    #[error("undecodable upstream response: {0}")]
    Decode(String),

    /// Configured base URL cannot be used.
    #[error("invalid upstream URL: {0}")]
    InvalidUrl(String),

    /// Caller-supplied content id cannot be a single path segment.
    #[error("invalid content id '{0}'")]
    InvalidId(String),
}

/// Result type for upstream operations.
pub type BackendResult<T> = Result<T, BackendError>;
