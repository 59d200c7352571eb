//! License enrichment hook.
//!
//! Runs after the controller. When the caller asked for license fields
//! with `?licenseDetails=name,url` and the response carries
//! `result.content` (a list or a single record), the records are passed
//! through the license resolver before the body is sent. Resolver failures
//! leave the content as it was.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use serde_json::Value;

use crate::config::loader::split_list;
use crate::http::request::RequestContext;
use crate::http::response::ApiError;
use crate::licenses::LicenseResolver;

/// Query parameter carrying the requested license fields.
pub const LICENSE_DETAILS_PARAM: &str = "licenseDetails";

/// Parse the requested license fields out of a query string.
pub fn requested_license_fields(query: Option<&str>) -> Vec<String> {
    let Some(query) = query else {
        return Vec::new();
    };
    url::form_urlencoded::parse(query.as_bytes())
        .filter(|(key, _)| key == LICENSE_DETAILS_PARAM)
        .flat_map(|(_, value)| split_list(&value))
        .collect()
}

pub async fn license_enrichment_middleware(
    State(resolver): State<Arc<LicenseResolver>>,
    req: Request,
    next: Next,
) -> Response {
    let requested = requested_license_fields(req.uri().query());
    if requested.is_empty() {
        return next.run(req).await;
    }

    let ctx = RequestContext::from_request(&req);
    let response = next.run(req).await;
    if !response.status().is_success() {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(msgid = %ctx.msgid, error = %e, "Failed to buffer response for license enrichment");
            return ctx.respond(Err(ApiError::server(
                "ERR_RESPONSE_UNREADABLE",
                "Unable to read the content response",
            )));
        }
    };

    let mut payload: Value = match serde_json::from_slice(&bytes) {
        Ok(payload) => payload,
        Err(_) => return Response::from_parts(parts, Body::from(bytes)),
    };
    let Some(content) = payload
        .get_mut("result")
        .and_then(|result| result.get_mut("content"))
    else {
        return Response::from_parts(parts, Body::from(bytes));
    };

    *content = match content.take() {
        Value::Array(records) => Value::Array(resolver.resolve_or_passthrough(records, &requested).await),
        record @ Value::Object(_) => resolver
            .resolve_or_passthrough(vec![record], &requested)
            .await
            .pop()
            .unwrap_or_default(),
        other => other,
    };

    match serde_json::to_vec(&payload) {
        Ok(body) => {
            parts.headers.remove(header::CONTENT_LENGTH);
            Response::from_parts(parts, Body::from(body))
        }
        Err(e) => {
            tracing::error!(msgid = %ctx.msgid, error = %e, "Failed to serialize enriched response");
            Response::from_parts(parts, Body::from(bytes))
        }
    }
}
