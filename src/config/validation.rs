//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Detect contradictory filter lists
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use url::Url;

use crate::config::schema::GatewayConfig;
use crate::licenses::MAX_TTL;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }
    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::new("listener.max_body_bytes", "must be > 0"));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be > 0"));
    }
    if config.timeouts.backend_secs == 0 {
        errors.push(ValidationError::new("timeouts.backend_secs", "must be > 0"));
    }

    match Url::parse(&config.backend.base_url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError::new(
            "backend.base_url",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(
            "backend.base_url",
            format!("'{}' is not a URL: {}", config.backend.base_url, e),
        )),
    }

    if config.licenses.cache_key_prefix.is_empty() {
        errors.push(ValidationError::new("licenses.cache_key_prefix", "must not be empty"));
    }
    if config.licenses.cache_ttl_secs == 0 {
        errors.push(ValidationError::new("licenses.cache_ttl_secs", "must be > 0"));
    } else if config.licenses.cache_ttl_secs > MAX_TTL.as_secs() {
        errors.push(ValidationError::new(
            "licenses.cache_ttl_secs",
            format!("must be <= {}", MAX_TTL.as_secs()),
        ));
    }

    for (field, list) in config.filters.entries() {
        if let Some(value) = list.whitelist.iter().find(|v| list.blacklist.contains(v)) {
            errors.push(ValidationError::new(
                "filters",
                format!("'{}' is both whitelisted and blacklisted for {}", value, field),
            ));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
