//! License resolution subsystem.
//!
//! # Data Flow
//! ```text
//! Content records + requested fields
//!     → engine.rs (collect license names, build cache keys)
//!     → cache.rs (batch lookup)
//!     → on total miss: CatalogSource (bounded catalog fetch) → cache.rs (repopulate)
//!     → engine.rs (project requested fields into `licenseDetails`)
//! ```
//!
//! # Known Limitations
//! - A partial cache hit is used as the whole directory for the pass;
//!   names missing from the cache resolve to `{}` until the entries expire
//!   and a later pass misses completely.
//! - The catalog fetch is a single page of `LICENSE_FETCH_LIMIT` entries.

pub mod cache;
pub mod engine;
pub mod types;

pub use cache::{CacheError, LicenseCache, MemoryLicenseCache, MAX_TTL};
pub use engine::{CatalogSource, LicenseResolver};
pub use types::{License, LicenseError, LicenseResult, LICENSE_FETCH_LIMIT};
