//! kld-cache
//!
//! In-memory TTL cache keyed by deterministic request fingerprints.
//!
//! This crate owns the cache store and the fingerprint function. It does
//! **not**:
//! - fetch data (no providers, no HTTP)
//! - decide TTL policy (callers supply a TTL per `set`; staleness tolerance
//!   differs per namespace)
//!
//! Concurrency discipline: one `std::sync::Mutex` around the map, held only
//! for the duration of a lookup/insert/delete. Callers must never hold it
//! across an upstream network call — the API makes that impossible by
//! returning owned values.

pub mod fingerprint;

pub use fingerprint::{fingerprint, Params};

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// Entry
// ---------------------------------------------------------------------------

/// A stored value plus its absolute expiry instant.
///
/// Owned exclusively by [`CacheStore`]; created on write, destroyed by the
/// read-time expiry check, a sweep, or `clear`.
#[derive(Debug, Clone)]
struct CacheEntry {
    value: serde_json::Value,
    expires_at: Instant,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// TTL key-value store addressed by `(namespace, params)` fingerprints.
///
/// A read never returns a value whose expiry has passed: expired entries are
/// treated as absent and removed as a side effect of the lookup. `sweep_expired`
/// additionally bounds memory growth under many distinct fingerprints, but is
/// not required for correctness.
#[derive(Debug, Default)]
pub struct CacheStore {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Look up the entry for `(namespace, params)`.
    ///
    /// Returns the stored value if present and unexpired. An expired entry is
    /// deleted and reported as absent. Miss is an expected outcome, not an
    /// error.
    pub fn get(&self, namespace: &str, params: &Params) -> Option<serde_json::Value> {
        let key = fingerprint(namespace, params);
        let mut map = self.lock();

        match map.get(&key) {
            Some(entry) if Instant::now() < entry.expires_at => Some(entry.value.clone()),
            Some(_) => {
                // Lazy self-heal: expired means absent.
                map.remove(&key);
                None
            }
            None => None,
        }
    }

    /// Store `value` for `(namespace, params)` with the given TTL.
    ///
    /// Overwrites any existing entry for the same fingerprint.
    pub fn set(&self, namespace: &str, params: &Params, value: serde_json::Value, ttl: Duration) {
        let key = fingerprint(namespace, params);
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.lock().insert(key, entry);
    }

    /// Empty the store unconditionally.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Remove all expired entries; returns how many were removed.
    ///
    /// Safe to call concurrently with `get`/`set` — it takes the same lock.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let mut map = self.lock();
        let before = map.len();
        map.retain(|_, entry| now < entry.expires_at);
        before - map.len()
    }

    /// Number of entries currently held (expired-but-unswept included).
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Acquire the map lock, recovering from poisoning. A panic while holding
    /// the lock cannot leave the map structurally broken (all mutations are
    /// single HashMap calls), so the contents remain usable.
    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
