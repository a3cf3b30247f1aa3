//! History orchestration: validate, fingerprint, cache, fetch, normalize.
//!
//! Per-request flow:
//! `Validating -> CacheLookup -> (hit -> done) | (miss -> FetchingUpstream
//! -> Normalizing -> CacheWrite -> done) | failed`
//!
//! Failed lookups are propagated and never written to the cache. Two
//! concurrent misses for the same fingerprint may both fetch upstream; both
//! writes are idempotent for identical parameters, so the second simply
//! wins.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, warn};

use kld_cache::{CacheStore, Params};
use kld_md::normalize::normalize_bars;
use kld_md::{Bar, MarketDataClient, Period};

use crate::errors::{DataQualityWarning, FeedError};
use crate::ttl::history_ttl;

const NS_HISTORY: &str = "history";

// ---------------------------------------------------------------------------
// Request / result types
// ---------------------------------------------------------------------------

/// Raw history request as it arrives from the HTTP boundary.
///
/// All fields optional here; validation and defaulting happen exactly once,
/// in [`HistoryService::fetch`], before the fingerprint is computed.
#[derive(Debug, Clone, Default)]
pub struct HistoryQuery {
    pub symbol: Option<String>,
    pub period: Option<String>,
    /// Epoch milliseconds, inclusive lower bound. Defaults to 0 (unbounded).
    pub from: Option<i64>,
    /// Epoch milliseconds, inclusive upper bound. Defaults to "now".
    pub to: Option<i64>,
}

/// A successful history response: clean ascending bars plus an optional
/// data-quality warning describing rows excluded during normalization.
#[derive(Debug, Clone)]
pub struct HistoryResult {
    pub bars: Vec<Bar>,
    pub warning: Option<DataQualityWarning>,
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Orchestrates history lookups over an injected cache and upstream client.
///
/// Both collaborators are constructor-injected; the service holds no other
/// state and is cheap to share behind an `Arc`.
pub struct HistoryService {
    cache: Arc<CacheStore>,
    client: Arc<dyn MarketDataClient>,
}

impl HistoryService {
    pub fn new(cache: Arc<CacheStore>, client: Arc<dyn MarketDataClient>) -> Self {
        Self { cache, client }
    }

    pub async fn fetch(&self, query: &HistoryQuery) -> Result<HistoryResult, FeedError> {
        // --- Validating ---
        let symbol = query
            .symbol
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(FeedError::MissingParameter("symbol"))?;

        let period = match query.period.as_deref() {
            None => Period::D1,
            Some(s) => Period::parse(s).ok_or_else(|| FeedError::UnsupportedPeriod {
                given: s.to_string(),
            })?,
        };

        // Defaulting happens before fingerprinting: the effective window is
        // part of the cache identity. An omitted `to` resolves to now-ms, so
        // open-ended requests made at different times land on different keys.
        // Accepted staleness/churn tradeoff.
        let from = query.from.unwrap_or(0);
        let to = query.to.unwrap_or_else(|| Utc::now().timestamp_millis());

        let params = history_params(symbol, period, from, to);

        // --- CacheLookup ---
        if let Some(value) = self.cache.get(NS_HISTORY, &params) {
            match serde_json::from_value::<Vec<Bar>>(value) {
                Ok(bars) => {
                    debug!(symbol, period = %period, "history cache hit");
                    // Drops were already accounted when this entry was
                    // written; a hit carries no new warning.
                    return Ok(HistoryResult {
                        bars,
                        warning: None,
                    });
                }
                Err(e) => {
                    // Undecodable entry: treat as a miss and refetch.
                    warn!(symbol, error = %e, "discarding undecodable history cache entry");
                }
            }
        }

        // --- FetchingUpstream ---
        let raw = self
            .client
            .fetch_bars(symbol, period)
            .await
            .map_err(FeedError::from)?;

        // --- Normalizing ---
        let (bars, stats) = normalize_bars(&raw, from, to);
        let warning = if stats.is_clean() {
            None
        } else {
            let w = DataQualityWarning {
                dropped_malformed: stats.malformed,
                dropped_duplicate_ts: stats.duplicate_ts,
            };
            warn!(symbol, period = %period, %w, "upstream rows excluded during normalization");
            Some(w)
        };

        // --- CacheWrite ---
        match serde_json::to_value(&bars) {
            Ok(payload) => self
                .cache
                .set(NS_HISTORY, &params, payload, history_ttl(period)),
            Err(e) => warn!(symbol, error = %e, "skipping cache write for history payload"),
        }

        Ok(HistoryResult { bars, warning })
    }
}

/// The exact effective parameter set, post-defaulting.
fn history_params(symbol: &str, period: Period, from: i64, to: i64) -> Params {
    let mut params = Params::new();
    params.insert("symbol".to_string(), json!(symbol));
    params.insert("period".to_string(), json!(period.as_str()));
    params.insert("from".to_string(), json!(from));
    params.insert("to".to_string(), json!(to));
    params
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
