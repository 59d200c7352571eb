//! Default search filters.
//!
//! Configured whitelist/blacklist values are merged into
//! `request.filters` of content search requests. A field the caller
//! already filters on is left alone. A whitelist becomes an inclusion
//! list; otherwise a blacklist becomes `{"ne": [...]}`.

use serde_json::{json, Map, Value};

use crate::config::FilterConfig;

pub fn apply_search_filters(request: &mut Map<String, Value>, config: &FilterConfig) {
    let filters = request
        .entry("filters")
        .or_insert_with(|| Value::Object(Map::new()));
    let Some(filters) = filters.as_object_mut() else {
        tracing::debug!("Search request filters are not an object, skipping defaults");
        return;
    };

    for (field, list) in config.entries() {
        if list.is_empty() || filters.contains_key(field) {
            continue;
        }
        if !list.whitelist.is_empty() {
            filters.insert(field.to_string(), json!(list.whitelist));
        } else if !list.blacklist.is_empty() {
            filters.insert(field.to_string(), json!({ "ne": list.blacklist }));
        }
    }
}
