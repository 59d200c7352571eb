//! Content gateway library.

pub mod backend;
pub mod config;
pub mod http;
pub mod licenses;
pub mod lifecycle;
pub mod observability;
pub mod store;

pub use config::schema::GatewayConfig;
pub use http::{AppState, GatewayServer};
pub use lifecycle::Shutdown;
