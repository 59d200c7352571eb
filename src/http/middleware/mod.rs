//! Pipeline stages applied around controllers.
//!
//! # Middleware Order
//!
//! ```text
//! request_context_middleware      (every route, outermost of the three)
//!   → store_gate_middleware       (note routes only, before the controller)
//!   → license_enrichment_middleware (content read routes, after the controller)
//!   → controller
//! ```

pub mod license_enrichment;
pub mod store_gate;

pub use license_enrichment::{license_enrichment_middleware, requested_license_fields, LICENSE_DETAILS_PARAM};
pub use store_gate::{store_gate_middleware, StoreGate};
