//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, route groups)
//!     → request.rs (stamp msgid and caller identifiers)
//!     → middleware/store_gate.rs (note routes: ensure the store is connected)
//!     → handlers/ (validate, call the content API or note store)
//!     → middleware/license_enrichment.rs (content reads: attach licenseDetails)
//!     → response.rs (envelope)
//!     → Send to client
//! ```

pub mod filters;
pub mod handlers;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestContext, MSGID_HEADER};
pub use response::{ApiError, ApiResponse};
pub use server::{build_router, AppState, GatewayServer};
