//! Request context stamping.
//!
//! # Responsibilities
//! - Derive the correlation id (`msgid`) for every request
//! - Collect device/consumer/user/session/channel identifiers
//! - Derive the API id reported in the response envelope
//! - Attach the context to the request for downstream stages
//!
//! # Design Decisions
//! - Headers win over body `params`; a fresh UUID is used when neither has a msgid
//! - Stamping never rejects a request; only an oversized or unreadable
//!   body does
//! - The msgid is echoed back in the `msgid` response header

use std::time::Instant;

use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures_util::StreamExt;
use serde_json::Value;
use tracing::Instrument;
use uuid::Uuid;

use crate::http::response::{ApiError, ApiResponse};
use crate::observability::metrics;

pub const MSGID_HEADER: &str = "msgid";
pub const DEVICE_ID_HEADER: &str = "x-device-id";
pub const CONSUMER_ID_HEADER: &str = "x-consumer-id";
pub const USER_ID_HEADER: &str = "x-authenticated-userid";
pub const SESSION_ID_HEADER: &str = "x-session-id";
pub const CHANNEL_ID_HEADER: &str = "x-channel-id";

pub const ERR_PAYLOAD_TOO_LARGE: &str = "ERR_PAYLOAD_TOO_LARGE";
pub const ERR_UNREADABLE_BODY: &str = "ERR_UNREADABLE_BODY";

/// Per-request context shared by every pipeline stage.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub msgid: String,
    pub did: Option<String>,
    pub cid: Option<String>,
    pub uid: Option<String>,
    pub sid: Option<String>,
    pub channel: Option<String>,
    pub api_id: String,
    pub started_at: Instant,
}

impl RequestContext {
    /// A context with only a msgid and an API id.
    pub fn new(msgid: String, path: &str) -> Self {
        Self {
            msgid,
            did: None,
            cid: None,
            uid: None,
            sid: None,
            channel: None,
            api_id: api_id_for_path(path),
            started_at: Instant::now(),
        }
    }

    /// Build the context from request headers and the parsed JSON body.
    pub fn stamp(path: &str, headers: &HeaderMap, body: Option<&Value>) -> Self {
        let lookup = |header: &str, param: &str| header_value(headers, header).or_else(|| body_param(body, param));

        let msgid = lookup(MSGID_HEADER, "msgid").unwrap_or_else(|| Uuid::new_v4().to_string());
        Self {
            did: lookup(DEVICE_ID_HEADER, "did"),
            cid: lookup(CONSUMER_ID_HEADER, "cid"),
            uid: lookup(USER_ID_HEADER, "uid"),
            sid: lookup(SESSION_ID_HEADER, "sid"),
            channel: lookup(CHANNEL_ID_HEADER, "channel"),
            ..Self::new(msgid, path)
        }
    }

    /// The context stamped on `req`, or a fresh one for requests that
    /// bypassed stamping.
    pub fn from_request(req: &Request) -> Self {
        req.extensions()
            .get::<Self>()
            .cloned()
            .unwrap_or_else(|| Self::stamp(req.uri().path(), req.headers(), None))
    }

    /// Render the final response. Consumes the context.
    pub fn respond(self, outcome: Result<Value, ApiError>) -> Response {
        match outcome {
            Ok(result) => ApiResponse::success(&self, result).into_response(),
            Err(error) => {
                tracing::debug!(
                    msgid = %self.msgid,
                    api_id = %self.api_id,
                    err = %error.err,
                    status = %error.status,
                    "Request failed"
                );
                ApiResponse::failure(&self, error).into_response()
            }
        }
    }
}

/// Map a route path to its API id: `/v1/content/read/do_1` → `api.content.read`.
pub fn api_id_for_path(path: &str) -> String {
    let segments: Vec<&str> = path
        .split('/')
        .filter(|s| !s.is_empty())
        .skip_while(|s| is_version_segment(s))
        .take(2)
        .collect();
    if segments.is_empty() {
        "api".to_string()
    } else {
        format!("api.{}", segments.join("."))
    }
}

fn is_version_segment(segment: &str) -> bool {
    segment.len() > 1
        && segment.starts_with('v')
        && segment[1..].chars().all(|c| c.is_ascii_digit())
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

fn body_param(body: Option<&Value>, name: &str) -> Option<String> {
    body?
        .get("params")?
        .get(name)?
        .as_str()
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Request body bound enforced while the context stage buffers the body.
#[derive(Debug, Clone, Copy)]
pub struct BodyLimit {
    pub max_bytes: usize,
}

enum BodyReadError {
    TooLarge,
    Unreadable(axum::Error),
}

/// Buffer `body`, failing as soon as it grows past `limit`.
async fn read_body(body: Body, limit: usize) -> Result<Bytes, BodyReadError> {
    let mut stream = body.into_data_stream();
    let mut buf = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(BodyReadError::Unreadable)?;
        if buf.len() + chunk.len() > limit {
            return Err(BodyReadError::TooLarge);
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(Bytes::from(buf))
}

fn declared_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

/// First pipeline stage: stamp the context, then call through.
///
/// A body over the limit is answered with 413 and an unreadable body with
/// 400; only a request that had no body reaches the controller empty.
pub async fn request_context_middleware(
    State(limit): State<BodyLimit>,
    req: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = req.into_parts();

    let read = if declared_length(&parts.headers).is_some_and(|len| len > limit.max_bytes) {
        Err(BodyReadError::TooLarge)
    } else {
        read_body(body, limit.max_bytes).await
    };
    let bytes = match read {
        Ok(bytes) => bytes,
        Err(e) => {
            let ctx = RequestContext::stamp(parts.uri.path(), &parts.headers, None);
            let error = match e {
                BodyReadError::TooLarge => {
                    tracing::warn!(msgid = %ctx.msgid, limit = limit.max_bytes, "Request body too large");
                    ApiError::new(
                        StatusCode::PAYLOAD_TOO_LARGE,
                        ERR_PAYLOAD_TOO_LARGE,
                        "Request body exceeds the size limit",
                    )
                }
                BodyReadError::Unreadable(e) => {
                    tracing::warn!(msgid = %ctx.msgid, error = %e, "Failed to read request body");
                    ApiError::client(ERR_UNREADABLE_BODY, "Request body could not be read")
                }
            };
            let msgid = ctx.msgid.clone();
            let started_at = ctx.started_at;
            let response = ctx.respond(Err(error));
            return finish(response, &msgid, &parts.method, started_at);
        }
    };
    let json = if bytes.is_empty() {
        None
    } else {
        serde_json::from_slice::<Value>(&bytes).ok()
    };

    let ctx = RequestContext::stamp(parts.uri.path(), &parts.headers, json.as_ref());
    let method: Method = parts.method.clone();
    let msgid = ctx.msgid.clone();
    let started_at = ctx.started_at;
    let span = tracing::info_span!("request", msgid = %ctx.msgid, api_id = %ctx.api_id);
    parts.extensions.insert(ctx);

    let response = next
        .run(Request::from_parts(parts, Body::from(bytes)))
        .instrument(span)
        .await;
    finish(response, &msgid, &method, started_at)
}

/// Echo the msgid and record the request.
fn finish(mut response: Response, msgid: &str, method: &Method, started_at: Instant) -> Response {
    if let Ok(value) = HeaderValue::from_str(msgid) {
        response.headers_mut().insert(MSGID_HEADER, value);
    }
    metrics::record_request(method.as_str(), response.status().as_u16(), started_at);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_api_id_for_path() {
        assert_eq!(api_id_for_path("/v1/content/search"), "api.content.search");
        assert_eq!(api_id_for_path("/v1/content/read/do_123"), "api.content.read");
        assert_eq!(api_id_for_path("/health"), "api.health");
        assert_eq!(api_id_for_path("/"), "api");
        assert_eq!(api_id_for_path("/vault/open"), "api.vault.open");
    }

    #[test]
    fn test_header_wins_over_body() {
        let mut headers = HeaderMap::new();
        headers.insert(MSGID_HEADER, HeaderValue::from_static("from-header"));
        headers.insert(DEVICE_ID_HEADER, HeaderValue::from_static("device-h"));
        let body = json!({"params": {"msgid": "from-body", "did": "device-b", "sid": "session-b"}});

        let ctx = RequestContext::stamp("/v1/notes/create", &headers, Some(&body));
        assert_eq!(ctx.msgid, "from-header");
        assert_eq!(ctx.did.as_deref(), Some("device-h"));
        assert_eq!(ctx.sid.as_deref(), Some("session-b"));
        assert!(ctx.uid.is_none());
    }

    #[test]
    fn test_body_msgid_used_without_header() {
        let body = json!({"params": {"msgid": "from-body"}});
        let ctx = RequestContext::stamp("/v1/content/search", &HeaderMap::new(), Some(&body));
        assert_eq!(ctx.msgid, "from-body");
    }

    fn limited_app(max_bytes: usize) -> axum::Router {
        axum::Router::new()
            .route(
                "/v1/content/create",
                axum::routing::post(|body: Bytes| async move { body.len().to_string() }),
            )
            .layer(axum::middleware::from_fn_with_state(
                BodyLimit { max_bytes },
                request_context_middleware,
            ))
    }

    #[tokio::test]
    async fn test_streamed_body_over_limit_is_rejected() {
        use tower::ServiceExt;

        let chunks: Vec<Result<Bytes, std::io::Error>> =
            vec![Ok(Bytes::from(vec![b'a'; 30])), Ok(Bytes::from(vec![b'b'; 20]))];
        let body = Body::from_stream(futures_util::stream::iter(chunks));
        let req = Request::builder()
            .method("POST")
            .uri("/v1/content/create")
            .header(MSGID_HEADER, "m-big")
            .body(body)
            .unwrap();

        let res = limited_app(16).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(res.headers()[MSGID_HEADER], "m-big");

        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["params"]["err"], ERR_PAYLOAD_TOO_LARGE);
        assert_eq!(body["params"]["msgid"], "m-big");
    }

    #[tokio::test]
    async fn test_declared_length_over_limit_is_rejected() {
        use tower::ServiceExt;

        let req = Request::builder()
            .method("POST")
            .uri("/v1/content/create")
            .header(header::CONTENT_LENGTH, "50")
            .body(Body::from(vec![b'a'; 50]))
            .unwrap();

        let res = limited_app(16).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_body_within_limit_reaches_handler_intact() {
        use tower::ServiceExt;

        let req = Request::builder()
            .method("POST")
            .uri("/v1/content/create")
            .body(Body::from(vec![b'a'; 16]))
            .unwrap();

        let res = limited_app(16).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"16");
    }

    #[test]
    fn test_generates_msgid_when_absent() {
        let ctx = RequestContext::stamp("/v1/content/search", &HeaderMap::new(), None);
        assert!(Uuid::parse_str(&ctx.msgid).is_ok());
        assert_eq!(ctx.api_id, "api.content.search");
    }
}
