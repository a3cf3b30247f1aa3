//! Catalog orchestration: cached full-list fetch plus local query matching.
//!
//! Matching is a pure filter over the complete catalog — the collaborator is
//! always asked for everything and never for its own search, so the
//! case-insensitive substring-on-two-fields semantics stay independent of
//! upstream capability.
//!
//! Availability over completeness: a collaborator failure degrades to an
//! empty list instead of an HTTP error. The catalog path is lower stakes
//! than history, which does propagate failures.

use std::sync::Arc;

use tracing::{debug, warn};

use kld_cache::{CacheStore, Params};
use kld_md::catalog::{SymbolCatalogSource, SymbolDescriptor};

use crate::ttl::CATALOG_TTL;

const NS_SYMBOLS: &str = "symbols";

/// Symbol search over an injected cache and catalog source.
pub struct CatalogService {
    cache: Arc<CacheStore>,
    source: Arc<dyn SymbolCatalogSource>,
}

impl CatalogService {
    pub fn new(cache: Arc<CacheStore>, source: Arc<dyn SymbolCatalogSource>) -> Self {
        Self { cache, source }
    }

    /// Case-insensitive substring search against ticker and name.
    ///
    /// Empty or absent query returns the full catalog in upstream order.
    /// Never fails: collaborator errors degrade to `[]`.
    pub async fn search(&self, query: Option<&str>) -> Vec<SymbolDescriptor> {
        let all = self.full_catalog().await;

        let needle = match query.map(str::trim).filter(|q| !q.is_empty()) {
            Some(q) => q.to_lowercase(),
            None => return all,
        };

        all.into_iter()
            .filter(|s| {
                s.ticker.to_lowercase().contains(&needle)
                    || s.name.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// The complete catalog, from cache when fresh.
    ///
    /// Failures are not cached: the next call retries upstream.
    async fn full_catalog(&self) -> Vec<SymbolDescriptor> {
        // The full list is one cache entry; the namespace alone identifies it.
        let params = Params::new();

        if let Some(value) = self.cache.get(NS_SYMBOLS, &params) {
            match serde_json::from_value::<Vec<SymbolDescriptor>>(value) {
                Ok(list) => {
                    debug!(count = list.len(), "catalog cache hit");
                    return list;
                }
                Err(e) => {
                    warn!(error = %e, "discarding undecodable catalog cache entry");
                }
            }
        }

        match self.source.fetch_all().await {
            Ok(list) => {
                match serde_json::to_value(&list) {
                    Ok(payload) => self.cache.set(NS_SYMBOLS, &params, payload, CATALOG_TTL),
                    Err(e) => warn!(error = %e, "skipping cache write for catalog payload"),
                }
                list
            }
            Err(e) => {
                warn!(error = %e, "catalog fetch failed; degrading to empty list");
                Vec::new()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
