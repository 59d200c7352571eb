//! License lookaside cache.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;

use crate::licenses::types::License;

/// Errors reported by a cache backend.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache unavailable: {0}")]
    Unavailable(String),
}

/// Keyed license store with per-entry TTL.
#[async_trait]
pub trait LicenseCache: Send + Sync {
    /// Look up `keys`. The result is positional; missing or expired slots are `None`.
    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<License>>, CacheError>;

    /// Store every entry with the same lifetime.
    async fn mset(&self, entries: Vec<(String, License)>, ttl: Duration) -> Result<(), CacheError>;
}

/// Longest lifetime an entry can have; longer TTLs are clamped to it.
pub const MAX_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

struct CacheEntry {
    license: License,
    expires_at: Instant,
}

/// In-process cache shared by all requests.
#[derive(Default)]
pub struct MemoryLicenseCache {
    entries: DashMap<String, CacheEntry>,
}

impl MemoryLicenseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included until they are touched.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn get(&self, key: &str) -> Option<License> {
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > Instant::now() {
                return Some(entry.license.clone());
            }
            drop(entry);
            self.evict_if_expired(key);
        }
        None
    }

    /// Remove `key` only if it is still expired; a concurrent refresh wins.
    fn evict_if_expired(&self, key: &str) {
        self.entries
            .remove_if(key, |_, entry| entry.expires_at <= Instant::now());
    }
}

#[async_trait]
impl LicenseCache for MemoryLicenseCache {
    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<License>>, CacheError> {
        Ok(keys.iter().map(|key| self.get(key)).collect())
    }

    async fn mset(&self, entries: Vec<(String, License)>, ttl: Duration) -> Result<(), CacheError> {
        let now = Instant::now();
        let expires_at = now + ttl.min(MAX_TTL);
        for (key, license) in entries {
            self.entries.insert(key, CacheEntry { license, expires_at });
        }
        Ok(())
    }
}
