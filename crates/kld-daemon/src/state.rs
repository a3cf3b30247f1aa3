//! Shared runtime state for kld-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum. The cache is built
//! here exactly once and injected into both services; its lifecycle is the
//! process lifecycle (no persistence, simply dropped at shutdown).

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use kld_cache::CacheStore;
use kld_feed::{CatalogService, HistoryService};
use kld_md::catalog::SymbolCatalogSource;
use kld_md::MarketDataClient;

// ---------------------------------------------------------------------------
// BuildInfo
// ---------------------------------------------------------------------------

/// Static build metadata included in the health response.
#[derive(Clone, Debug)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// Shared handle across all Axum handlers.
pub struct AppState {
    pub build: BuildInfo,
    /// The one process-wide cache instance, shared by both services and the
    /// background sweeper.
    pub cache: Arc<CacheStore>,
    pub history: HistoryService,
    pub catalog: CatalogService,
}

impl AppState {
    /// Wire the services around an explicitly constructed cache.
    ///
    /// Collaborator implementations are injected so tests can substitute
    /// counting doubles for the live Sina clients.
    pub fn new(
        client: Arc<dyn MarketDataClient>,
        source: Arc<dyn SymbolCatalogSource>,
    ) -> Self {
        let cache = Arc::new(CacheStore::new());

        Self {
            build: BuildInfo {
                service: "kld-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
            history: HistoryService::new(Arc::clone(&cache), client),
            catalog: CatalogService::new(Arc::clone(&cache), source),
            cache,
        }
    }
}

// ---------------------------------------------------------------------------
// Background sweep
// ---------------------------------------------------------------------------

/// Spawn a background task that sweeps expired cache entries every
/// `interval`.
///
/// Lazy read-time expiry already guarantees correctness; the sweep only
/// bounds memory growth under many distinct fingerprints.
pub fn spawn_cache_sweeper(cache: Arc<CacheStore>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let removed = cache.sweep_expired();
            if removed > 0 {
                debug!(removed, "cache sweep removed expired entries");
            }
        }
    });
}
