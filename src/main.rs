//! Content gateway.
//!
//! Fronts the content API and a note store behind one HTTP surface.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌───────────────────────────────────────────────┐
//!                      │                CONTENT GATEWAY                │
//!                      │                                               │
//!   Client Request     │  ┌─────────┐   ┌──────────┐   ┌───────────┐   │
//!   ───────────────────┼─▶│ request │──▶│  store   │──▶│ handlers  │───┼──▶ Content API
//!                      │  │ context │   │  gate    │   │           │   │
//!                      │  └─────────┘   └──────────┘   └─────┬─────┘   │
//!                      │                                     │         │
//!   Client Response    │  ┌──────────┐   ┌───────────────┐   │         │
//!   ◀──────────────────┼──│ envelope │◀──│   license     │◀──┘         │
//!                      │  │          │   │  enrichment   │──▶ license  │
//!                      │  └──────────┘   └───────────────┘    cache    │
//!                      └───────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use content_gateway::backend::BackendClient;
use content_gateway::config::watcher::{apply_filter_updates, ConfigWatcher};
use content_gateway::config::{load_config, load_from_env, GatewayConfig};
use content_gateway::http::{AppState, GatewayServer};
use content_gateway::licenses::{LicenseResolver, MemoryLicenseCache};
use content_gateway::lifecycle::Shutdown;
use content_gateway::observability::{logging, metrics};
use content_gateway::store::{MemoryNoteStore, NoteStore};

#[derive(Parser, Debug)]
#[command(name = "content-gateway", version, about = "Content and notes API gateway")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config: GatewayConfig = match &cli.config {
        Some(path) => load_config(path)?,
        None => load_from_env()?,
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init(&config.observability.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "content-gateway starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        backend = %config.backend.base_url,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let backend = Arc::new(BackendClient::new(
        &config.backend,
        Duration::from_secs(config.timeouts.backend_secs),
    )?);
    let resolver = Arc::new(LicenseResolver::new(
        Arc::new(MemoryLicenseCache::new()),
        backend.clone(),
        &config.licenses,
    ));

    if config.licenses.preload_on_startup {
        match resolver.preload_catalog().await {
            Ok(count) => tracing::info!(count, "License catalog preloaded"),
            Err(e) => {
                tracing::error!(error = %e, "License catalog preload failed");
                std::process::exit(1);
            }
        }
    }

    let notes = Arc::new(MemoryNoteStore::new());
    if let Err(e) = notes.connect().await {
        tracing::warn!(error = %e, "Note store not reachable at startup, will retry per request");
    }

    let state = AppState::new(config.clone(), backend, notes, resolver);

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    // Hot reload of search filter lists. The watcher handle must outlive the server.
    let _watcher = match &cli.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path, config.filters.clone());
            tokio::spawn(apply_filter_updates(
                updates,
                state.filters.clone(),
                shutdown.triggered(),
            ));
            match watcher.run() {
                Ok(handle) => Some(handle),
                Err(e) => {
                    tracing::warn!(error = %e, "Config watcher unavailable, hot reload disabled");
                    None
                }
            }
        }
        None => None,
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    GatewayServer::new(state)
        .run(listener, shutdown.triggered())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
