//! License resolution engine.
//!
//! Attaches `licenseDetails` to content records that name a license,
//! reading from the lookaside cache first and falling back to one bounded
//! catalog fetch when the cache has none of the requested names.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::backend::BackendResult;
use crate::config::LicenseConfig;
use crate::licenses::cache::LicenseCache;
use crate::licenses::types::{License, LicenseResult, LICENSE_FETCH_LIMIT};
use crate::observability::metrics;

/// Field added to enriched content records.
pub const LICENSE_DETAILS_FIELD: &str = "licenseDetails";

/// Authoritative source of license records.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch at most `limit` license records.
    async fn fetch_licenses(&self, limit: usize) -> BackendResult<Vec<License>>;
}

/// Resolves license names on content records to license details.
pub struct LicenseResolver {
    cache: Arc<dyn LicenseCache>,
    catalog: Arc<dyn CatalogSource>,
    key_prefix: String,
    ttl: Duration,
}

impl LicenseResolver {
    pub fn new(
        cache: Arc<dyn LicenseCache>,
        catalog: Arc<dyn CatalogSource>,
        config: &LicenseConfig,
    ) -> Self {
        Self {
            cache,
            catalog,
            key_prefix: config.cache_key_prefix.clone(),
            ttl: Duration::from_secs(config.cache_ttl_secs),
        }
    }

    pub fn cache_key(&self, name: &str) -> String {
        format!("{}{}", self.key_prefix, name)
    }

    /// Enrich every record that names a license.
    ///
    /// Records without a `license` string are returned untouched. A named
    /// license that cannot be found yields `licenseDetails: {}`. With no
    /// requested fields the input is returned as is. Cache or catalog
    /// failures abort the whole batch.
    pub async fn resolve_licenses(
        &self,
        records: Vec<Value>,
        requested: &[String],
    ) -> LicenseResult<Vec<Value>> {
        Ok(match self.directory_for(&records, requested).await? {
            Some(directory) => enrich(records, requested, &directory),
            None => records,
        })
    }

    /// Like [`resolve_licenses`](Self::resolve_licenses), but a failure is
    /// logged and the records come back unmodified.
    pub async fn resolve_or_passthrough(&self, records: Vec<Value>, requested: &[String]) -> Vec<Value> {
        match self.directory_for(&records, requested).await {
            Ok(Some(directory)) => enrich(records, requested, &directory),
            Ok(None) => records,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    records = records.len(),
                    "License enrichment failed, returning records without details"
                );
                records
            }
        }
    }

    /// Fetch the catalog and write it into the cache. Returns the number of
    /// licenses fetched.
    pub async fn preload_catalog(&self) -> LicenseResult<usize> {
        let licenses = self.fetch_and_populate().await?;
        tracing::info!(count = licenses.len(), "License catalog loaded into cache");
        Ok(licenses.len())
    }

    /// Name → license map for this pass, or `None` when nothing needs resolving.
    async fn directory_for(
        &self,
        records: &[Value],
        requested: &[String],
    ) -> LicenseResult<Option<HashMap<String, License>>> {
        if requested.is_empty() {
            return Ok(None);
        }
        let names: Vec<&str> = records
            .iter()
            .filter_map(license_name)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if names.is_empty() {
            return Ok(None);
        }

        let keys: Vec<String> = names.iter().map(|name| self.cache_key(name)).collect();
        let cached = self.cache.mget(&keys).await?;
        let hits: HashMap<String, License> = names
            .iter()
            .zip(cached)
            .filter_map(|(name, slot)| slot.map(|license| (name.to_string(), license)))
            .collect();

        metrics::record_license_cache("hit", hits.len());
        metrics::record_license_cache("miss", names.len() - hits.len());

        if !hits.is_empty() {
            if hits.len() < names.len() {
                tracing::debug!(
                    requested = names.len(),
                    cached = hits.len(),
                    "Partial license cache hit, uncached names resolve empty"
                );
            }
            return Ok(Some(hits));
        }

        tracing::debug!(names = names.len(), "License cache miss, fetching catalog");
        let directory = self
            .fetch_and_populate()
            .await?
            .into_iter()
            .filter_map(|license| {
                let name = license.name()?.to_owned();
                Some((name, license))
            })
            .collect();
        Ok(Some(directory))
    }

    async fn fetch_and_populate(&self) -> LicenseResult<Vec<License>> {
        let licenses = match self.catalog.fetch_licenses(LICENSE_FETCH_LIMIT).await {
            Ok(licenses) => {
                metrics::record_catalog_fetch("ok");
                licenses
            }
            Err(e) => {
                metrics::record_catalog_fetch("error");
                return Err(e.into());
            }
        };

        if licenses.len() >= LICENSE_FETCH_LIMIT {
            tracing::warn!(
                limit = LICENSE_FETCH_LIMIT,
                "License catalog filled a whole page, later entries are not loaded"
            );
        }

        let entries: Vec<(String, License)> = licenses
            .iter()
            .filter_map(|license| license.name().map(|name| (self.cache_key(name), license.clone())))
            .collect();
        if !entries.is_empty() {
            if let Err(e) = self.cache.mset(entries, self.ttl).await {
                tracing::warn!(error = %e, "Failed to store license catalog in cache");
            }
        }

        Ok(licenses)
    }
}

fn license_name(record: &Value) -> Option<&str> {
    record.get("license").and_then(Value::as_str)
}

fn enrich(
    mut records: Vec<Value>,
    requested: &[String],
    directory: &HashMap<String, License>,
) -> Vec<Value> {
    for record in records.iter_mut() {
        let details = match license_name(record) {
            Some(name) => directory
                .get(name)
                .map(|license| license.project(requested))
                .unwrap_or_default(),
            None => continue,
        };
        if let Some(fields) = record.as_object_mut() {
            fields.insert(LICENSE_DETAILS_FIELD.to_string(), Value::Object(details));
        }
    }
    records
}
