//! Config file watcher for hot reload of the search filter lists.
//!
//! Every change to the file is reloaded and validated in full. Only the
//! filter lists are forwarded, and only when they differ from the last
//! forwarded value; an invalid file keeps the current filters.
//! [`apply_filter_updates`] swaps forwarded sets into the live holder.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::FilterConfig;

pub struct ConfigWatcher {
    path: PathBuf,
    current: FilterConfig,
    update_tx: mpsc::UnboundedSender<FilterConfig>,
}

impl ConfigWatcher {
    /// `current` is the filter set already in effect.
    pub fn new(path: &Path, current: FilterConfig) -> (Self, mpsc::UnboundedReceiver<FilterConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        (
            Self {
                path: path.to_path_buf(),
                current,
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching. The returned handle must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self {
            path,
            mut current,
            update_tx,
        } = self;
        let reload_path = path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    if let Some(filters) = reload_filters(&reload_path, &mut current) {
                        if update_tx.send(filters).is_err() {
                            tracing::warn!("Filter reload receiver dropped");
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&path, RecursiveMode::NonRecursive)?;
        tracing::info!(path = ?path, "Config watcher started");
        Ok(watcher)
    }
}

/// Swap each received filter set into `filters` until `shutdown` resolves
/// or the watcher goes away.
pub async fn apply_filter_updates<F>(
    mut updates: mpsc::UnboundedReceiver<FilterConfig>,
    filters: Arc<ArcSwap<FilterConfig>>,
    shutdown: F,
) where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            update = updates.recv() => match update {
                Some(new_filters) => {
                    filters.store(Arc::new(new_filters));
                    tracing::info!("Search filters reloaded");
                }
                None => break,
            },
        }
    }
    tracing::debug!("Filter reload loop stopped");
}

/// Reload `path`; returns the new filters when they differ from `current`.
fn reload_filters(path: &Path, current: &mut FilterConfig) -> Option<FilterConfig> {
    match load_config(path) {
        Ok(config) if config.filters == *current => {
            tracing::debug!("Config file changed, filters unchanged");
            None
        }
        Ok(config) => {
            tracing::info!("Search filters changed, reloading");
            *current = config.filters.clone();
            Some(config.filters)
        }
        Err(e) => {
            tracing::error!(error = %e, "Config reload failed, keeping current filters");
            None
        }
    }
}
