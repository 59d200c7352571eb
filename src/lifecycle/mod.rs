//! Process lifecycle.
//!
//! ```text
//! SIGTERM/SIGINT (signals.rs)
//!     → Shutdown::trigger (shutdown.rs)
//!     → GatewayServer stops accepting, drains in-flight requests
//!     → main returns
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
