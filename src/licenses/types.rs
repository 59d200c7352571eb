//! License records and error definitions.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::backend::BackendError;
use crate::licenses::cache::CacheError;

/// Page size of a catalog fetch. No further pages are requested.
pub const LICENSE_FETCH_LIMIT: usize = 100;

/// A license record as served by the content catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct License(Map<String, Value>);

impl License {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Wrap a JSON value, rejecting anything that is not an object.
    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_object().cloned().map(Self)
    }

    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(Value::as_str)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Copy the requested fields that this record has.
    ///
    /// Requested names the record lacks produce no key.
    pub fn project(&self, requested: &[String]) -> Map<String, Value> {
        requested
            .iter()
            .filter_map(|field| self.0.get(field).map(|v| (field.clone(), v.clone())))
            .collect()
    }
}

/// Errors that abort a resolution pass.
#[derive(Debug, Error)]
pub enum LicenseError {
    #[error("license cache failure: {0}")]
    Cache(#[from] CacheError),

    #[error("license catalog fetch failed: {0}")]
    Catalog(#[from] BackendError),
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
