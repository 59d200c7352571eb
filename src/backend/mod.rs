//! Upstream content API subsystem.
//!
//! # Data Flow
//! ```text
//! Controller / license engine
//!     → client.rs (build URL, attach credentials, send with timeout)
//!     → types.rs (decode response envelope, classify failures)
//! ```
//!
//! # Design Decisions
//! - A call succeeds only when transport, HTTP status and `responseCode` all agree
//! - Upstream envelopes are kept intact on failure so controllers can relay them

pub mod client;
pub mod types;

pub use client::BackendClient;
pub use types::{BackendError, BackendResult, ResponseEnvelope, ResponseParams};
