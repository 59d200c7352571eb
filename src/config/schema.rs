//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the content gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, body limits).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Upstream content API settings.
    pub backend: BackendConfig,

    /// License lookaside cache settings.
    pub licenses: LicenseConfig,

    /// Note store settings.
    pub store: StoreConfig,

    /// Default search filters (hot-reloadable).
    pub filters: FilterConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5000".to_string(),
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time allowed for one inbound request, in seconds.
    pub request_secs: u64,

    /// Timeout for a single upstream call, in seconds.
    pub backend_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            backend_secs: 10,
        }
    }
}

/// Upstream content API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the content API (e.g., "https://api.ekstep.in").
    pub base_url: String,

    /// Bearer token sent with every upstream call.
    pub api_key: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.ekstep.in".to_string(),
            api_key: None,
        }
    }
}

/// License cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LicenseConfig {
    /// Prefix prepended to license names to form cache keys.
    pub cache_key_prefix: String,

    /// Lifetime of cached license entries, in seconds.
    pub cache_ttl_secs: u64,

    /// Load the full license catalog before accepting traffic.
    /// A failed preload stops the process.
    pub preload_on_startup: bool,
}

impl Default for LicenseConfig {
    fn default() -> Self {
        Self {
            cache_key_prefix: "license_".to_string(),
            cache_ttl_secs: 86_400,
            preload_on_startup: false,
        }
    }
}

/// Note store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// How long the connectivity gate waits for a reconnect, in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 5,
        }
    }
}

/// Whitelist/blacklist pair for one search field.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct FilterList {
    pub whitelist: Vec<String>,
    pub blacklist: Vec<String>,
}

impl FilterList {
    pub fn is_empty(&self) -> bool {
        self.whitelist.is_empty() && self.blacklist.is_empty()
    }
}

/// Default filters merged into content search requests.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct FilterConfig {
    pub channel: FilterList,
    pub framework: FilterList,
    pub mime_type: FilterList,
    pub content_type: FilterList,
    pub resource_type: FilterList,
}

impl FilterConfig {
    /// Filter lists paired with the search field they apply to.
    pub fn entries(&self) -> [(&'static str, &FilterList); 5] {
        [
            ("channel", &self.channel),
            ("framework", &self.framework),
            ("mimeType", &self.mime_type),
            ("contentType", &self.content_type),
            ("resourceType", &self.resource_type),
        ]
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
