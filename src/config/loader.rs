//! Configuration loading from disk and environment.
//!
//! Precedence: defaults, then the TOML file, then `GATEWAY_*` variables.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{FilterList, GatewayConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value '{value}' for {var}")]
    Env { var: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file, with environment overrides.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config: GatewayConfig = toml::from_str(&content)?;

    apply_env_overrides(&mut config, |var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Build configuration from defaults and the process environment only.
pub fn load_from_env() -> Result<GatewayConfig, ConfigError> {
    let mut config = GatewayConfig::default();

    apply_env_overrides(&mut config, |var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply `GATEWAY_*` overrides using `lookup` to read variables.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("GATEWAY_BIND_ADDRESS") {
        config.listener.bind_address = v;
    }
    if let Some(v) = lookup("GATEWAY_BACKEND_URL") {
        config.backend.base_url = v;
    }
    if let Some(v) = lookup("GATEWAY_BACKEND_API_KEY") {
        config.backend.api_key = Some(v);
    }
    if let Some(v) = lookup("GATEWAY_LICENSE_CACHE_PREFIX") {
        config.licenses.cache_key_prefix = v;
    }
    if let Some(v) = lookup("GATEWAY_LICENSE_CACHE_TTL_SECS") {
        config.licenses.cache_ttl_secs = parse_number("GATEWAY_LICENSE_CACHE_TTL_SECS", v)?;
    }
    if let Some(v) = lookup("GATEWAY_LICENSE_PRELOAD") {
        config.licenses.preload_on_startup = parse_bool("GATEWAY_LICENSE_PRELOAD", v)?;
    }
    if let Some(v) = lookup("GATEWAY_LOG_LEVEL") {
        config.observability.log_level = v;
    }

    let filters = &mut config.filters;
    override_list(&lookup, "GATEWAY_CHANNEL_FILTER", &mut filters.channel);
    override_list(&lookup, "GATEWAY_FRAMEWORK_FILTER", &mut filters.framework);
    override_list(&lookup, "GATEWAY_MIMETYPE_FILTER", &mut filters.mime_type);
    override_list(&lookup, "GATEWAY_CONTENTTYPE_FILTER", &mut filters.content_type);
    override_list(&lookup, "GATEWAY_RESOURCETYPE_FILTER", &mut filters.resource_type);

    Ok(())
}

fn override_list<F>(lookup: &F, prefix: &str, list: &mut FilterList)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup(&format!("{}_WHITELIST", prefix)) {
        list.whitelist = split_list(&v);
    }
    if let Some(v) = lookup(&format!("{}_BLACKLIST", prefix)) {
        list.blacklist = split_list(&v);
    }
}

/// Split a comma-separated value, dropping blanks.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_number(var: &'static str, value: String) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Env { var, value })
}

fn parse_bool(var: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(ConfigError::Env { var, value }),
    }
}
