//! HTTP client for the upstream content API.
//!
//! # Responsibilities
//! - Build endpoint URLs from the configured base URL
//! - Attach credentials and the caller's msgid to every call
//! - Decode and classify upstream responses
//! - Serve the license catalog to the license engine

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use url::Url;

use crate::backend::types::{BackendError, BackendResult, ResponseEnvelope};
use crate::config::BackendConfig;
use crate::licenses::{CatalogSource, License};

const SEARCH_PATH: &[&str] = &["search", "v3", "search"];
const CONTENT_PATH: &[&str] = &["content", "v3"];

/// Upstream content API client.
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
}

impl BackendClient {
    /// Create a client for the configured upstream.
    pub fn new(config: &BackendConfig, timeout: Duration) -> BackendResult<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| BackendError::InvalidUrl(format!("'{}': {}", config.base_url, e)))?;
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url,
            api_key: config.api_key.clone(),
        })
    }

    /// Search the content catalog.
    pub async fn search(&self, body: &Value, msgid: &str) -> BackendResult<ResponseEnvelope> {
        let url = self.endpoint(SEARCH_PATH, &[])?;
        self.send(Method::POST, url, Some(body), msgid).await
    }

    /// Read one content item, optionally restricted to `fields`.
    pub async fn get_content(
        &self,
        id: &str,
        fields: Option<&str>,
        msgid: &str,
    ) -> BackendResult<ResponseEnvelope> {
        let mut url = self.endpoint(CONTENT_PATH, &["read", content_id(id)?])?;
        if let Some(fields) = fields {
            url.query_pairs_mut().append_pair("fields", fields);
        }
        self.send(Method::GET, url, None, msgid).await
    }

    pub async fn create_content(&self, body: &Value, msgid: &str) -> BackendResult<ResponseEnvelope> {
        let url = self.endpoint(CONTENT_PATH, &["create"])?;
        self.send(Method::POST, url, Some(body), msgid).await
    }

    pub async fn update_content(
        &self,
        id: &str,
        body: &Value,
        msgid: &str,
    ) -> BackendResult<ResponseEnvelope> {
        let url = self.endpoint(CONTENT_PATH, &["update", content_id(id)?])?;
        self.send(Method::PATCH, url, Some(body), msgid).await
    }

    pub async fn publish_content(
        &self,
        id: &str,
        body: &Value,
        msgid: &str,
    ) -> BackendResult<ResponseEnvelope> {
        let url = self.endpoint(CONTENT_PATH, &["publish", content_id(id)?])?;
        self.send(Method::POST, url, Some(body), msgid).await
    }

    pub async fn retire_content(&self, id: &str, msgid: &str) -> BackendResult<ResponseEnvelope> {
        let url = self.endpoint(CONTENT_PATH, &["retire", content_id(id)?])?;
        self.send(Method::DELETE, url, None, msgid).await
    }

    /// `base` + fixed `prefix` + `segments`, each segment percent-encoded.
    fn endpoint(&self, prefix: &[&str], segments: &[&str]) -> BackendResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| BackendError::InvalidUrl(format!("'{}' cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend(prefix)
            .extend(segments);
        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
        msgid: &str,
    ) -> BackendResult<ResponseEnvelope> {
        let path = url.path().to_string();
        tracing::debug!(msgid = %msgid, method = %method, url = %url, "Calling upstream");

        let mut request = self.http.request(method, url).header("msgid", msgid);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        let mut envelope: ResponseEnvelope = serde_json::from_slice(&bytes).map_err(|e| {
            tracing::warn!(msgid = %msgid, status = %status, error = %e, "Upstream body is not an envelope");
            BackendError::Decode(format!("{} from {}: {}", status, path, e))
        })?;
        envelope.status_code = status.as_u16();

        if !status.is_success() || !envelope.is_ok() {
            tracing::warn!(
                msgid = %msgid,
                status = %status,
                response_code = %envelope.response_code,
                err = ?envelope.params.err,
                "Upstream call failed"
            );
            let status = if status.is_success() {
                StatusCode::INTERNAL_SERVER_ERROR.as_u16()
            } else {
                status.as_u16()
            };
            return Err(BackendError::Upstream {
                status,
                envelope: Box::new(envelope),
            });
        }

        Ok(envelope)
    }
}

/// An id must stay one plain path segment: identifier characters only,
/// and never a dot segment.
fn content_id(id: &str) -> BackendResult<&str> {
    let plain = id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'));
    if !plain || id.trim_matches('.').is_empty() {
        return Err(BackendError::InvalidId(id.to_string()));
    }
    Ok(id)
}

#[async_trait]
impl CatalogSource for BackendClient {
    async fn fetch_licenses(&self, limit: usize) -> BackendResult<Vec<License>> {
        let body = json!({
            "request": {
                "filters": { "objectType": "License" },
                "limit": limit
            }
        });
        let envelope = self.search(&body, &uuid::Uuid::new_v4().to_string()).await?;

        let licenses = envelope
            .result
            .get("license")
            .and_then(Value::as_array)
            .map(|entries| entries.iter().filter_map(License::from_value).collect())
            .unwrap_or_default();
        Ok(licenses)
    }
}
