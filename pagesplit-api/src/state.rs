//! Application state shared across handlers.

use crate::config::Config;
use pagesplit::{
    DocumentBackend, InMemorySessionStore, LopdfBackend, PdfSplitter, SessionStore, SplitOptions,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Splitter over whichever document backend the state was built with
pub type SharedSplitter = PdfSplitter<Arc<dyn DocumentBackend>>;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub splitter: Arc<SharedSplitter>,
    pub store: Arc<dyn SessionStore>,
}

impl AppState {
    /// State with an in-memory session store sized from `config`.
    pub fn new(config: Config) -> Self {
        let store = Arc::new(InMemorySessionStore::new(config.session_ttl));
        Self::with_store(config, store)
    }

    /// State backed by an externally constructed session store.
    pub fn with_store(config: Config, store: Arc<dyn SessionStore>) -> Self {
        Self::with_backend(config, store, Arc::new(LopdfBackend::new()))
    }

    /// State with both the session store and the document backend supplied.
    pub fn with_backend(
        config: Config,
        store: Arc<dyn SessionStore>,
        backend: Arc<dyn DocumentBackend>,
    ) -> Self {
        let splitter = PdfSplitter::new(
            backend,
            SplitOptions::default().with_max_document_size(config.max_document_bytes),
        );

        Self {
            config: Arc::new(config),
            splitter: Arc::new(splitter),
            store,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

/// Periodically drop sessions whose TTL has passed.
///
/// Lookups already ignore expired sessions; the sweep only bounds how long
/// their pages stay in memory when nobody asks for them again.
pub fn spawn_session_sweeper(store: Arc<dyn SessionStore>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            let removed = store.sweep_expired();
            if removed > 0 {
                tracing::debug!(removed, live = store.len(), "Session sweep finished");
            }
        }
    })
}
