//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with every controller
//! - Attach the pipeline stages to the right route groups
//! - Wire up middleware (tracing, timeouts, request context with body limit)
//! - Serve until the shutdown signal fires

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::backend::BackendClient;
use crate::config::{FilterConfig, GatewayConfig};
use crate::http::handlers::{content, health, notes};
use crate::http::middleware::{license_enrichment_middleware, store_gate_middleware, StoreGate};
use crate::http::request::{request_context_middleware, BodyLimit};
use crate::licenses::LicenseResolver;
use crate::store::NoteStore;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<BackendClient>,
    pub notes: Arc<dyn NoteStore>,
    pub resolver: Arc<LicenseResolver>,
    /// Search filter defaults; swapped in place on config reload.
    pub filters: Arc<ArcSwap<FilterConfig>>,
    pub config: Arc<GatewayConfig>,
}

impl AppState {
    pub fn new(
        config: GatewayConfig,
        backend: Arc<BackendClient>,
        notes: Arc<dyn NoteStore>,
        resolver: Arc<LicenseResolver>,
    ) -> Self {
        Self {
            backend,
            notes,
            resolver,
            filters: Arc::new(ArcSwap::from_pointee(config.filters.clone())),
            config: Arc::new(config),
        }
    }
}

/// HTTP server for the content gateway.
pub struct GatewayServer {
    router: Router,
    config: Arc<GatewayConfig>,
}

impl GatewayServer {
    pub fn new(state: AppState) -> Self {
        let config = state.config.clone();
        let router = build_router(&config, state);
        Self { router, config }
    }

    /// Run the server until `shutdown` resolves, then drain in-flight requests.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.await;
                tracing::info!("Draining in-flight requests");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// Build the Axum router with all middleware layers.
///
/// Content reads run through license enrichment, note routes through the
/// store gate, and every route through request-context stamping, which
/// also enforces the body size limit.
#[allow(deprecated)]
pub fn build_router(config: &GatewayConfig, state: AppState) -> Router {
    let enriched = Router::new()
        .route("/v1/content/search", post(content::search))
        .route("/v1/content/read/{id}", get(content::read))
        .route_layer(middleware::from_fn_with_state(
            state.resolver.clone(),
            license_enrichment_middleware,
        ));

    let content_writes = Router::new()
        .route("/v1/content/create", post(content::create))
        .route("/v1/content/update/{id}", patch(content::update))
        .route("/v1/content/publish/{id}", post(content::publish))
        .route("/v1/content/retire/{id}", delete(content::retire));

    let gate = StoreGate {
        store: state.notes.clone(),
        connect_timeout: Duration::from_secs(config.store.connect_timeout_secs),
    };
    let note_routes = Router::new()
        .route("/v1/notes/create", post(notes::create))
        .route("/v1/notes/read/{id}", get(notes::read))
        .route("/v1/notes/update/{id}", patch(notes::update))
        .route("/v1/notes/delete/{id}", delete(notes::delete))
        .route("/v1/notes/search", post(notes::search))
        .route_layer(middleware::from_fn_with_state(gate, store_gate_middleware));

    Router::new()
        .route("/health", get(health::health))
        .merge(enriched)
        .merge(content_writes)
        .merge(note_routes)
        .with_state(state)
        .layer(middleware::from_fn_with_state(
            BodyLimit {
                max_bytes: config.listener.max_body_bytes,
            },
            request_context_middleware,
        ))
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
        .layer(TraceLayer::new_for_http())
}
