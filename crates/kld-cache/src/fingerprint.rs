//! Deterministic request fingerprints for cache addressing.
//!
//! A fingerprint is derived from a namespace string and an unordered
//! parameter map. Two calls with the same namespace and the same parameter
//! values must produce the identical key regardless of insertion order;
//! distinct namespaces must never collide even with identical params.
//!
//! The hash input is the compact JSON of the two-element array
//! `[namespace, params]` with all object keys sorted recursively. The
//! structured encoding means a parameter value containing a separator
//! character cannot masquerade as part of the namespace.

use std::collections::BTreeMap;

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Parameter map for fingerprinting. `BTreeMap` keeps top-level keys sorted;
/// nested objects inside values are sorted by [`sort_keys`] before hashing.
pub type Params = BTreeMap<String, Value>;

/// Compute the cache key for `(namespace, params)`.
///
/// Pure and deterministic: no side effects, no clock, no RNG. Returns a
/// 64-char lowercase hex SHA-256 digest. Collision resistance is the goal,
/// not secrecy.
pub fn fingerprint(namespace: &str, params: &Params) -> String {
    let canonical = Value::Array(vec![
        Value::String(namespace.to_string()),
        sort_keys(&Value::Object(
            params
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )),
    ]);

    // Compact JSON of a key-sorted tree is canonical: same logical input,
    // same bytes.
    let bytes = canonical.to_string();

    let mut hasher = Sha256::new();
    hasher.update(bytes.as_bytes());
    hex::encode(hasher.finalize())
}

/// Recursively sort object keys so serialization is order-independent.
fn sort_keys(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut keys: Vec<_> = map.keys().cloned().collect();
            keys.sort();
            let mut new = serde_json::Map::new();
            for k in keys {
                new.insert(k.clone(), sort_keys(&map[&k]));
            }
            Value::Object(new)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_keys).collect()),
        _ => v.clone(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params_of(pairs: &[(&str, Value)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn same_params_same_key() {
        let p = params_of(&[("symbol", json!("rb2505")), ("period", json!("1d"))]);
        assert_eq!(fingerprint("history", &p), fingerprint("history", &p));
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let a = params_of(&[("symbol", json!("rb2505")), ("period", json!("1d"))]);
        let b = params_of(&[("period", json!("1d")), ("symbol", json!("rb2505"))]);
        assert_eq!(fingerprint("history", &a), fingerprint("history", &b));
    }

    #[test]
    fn differing_value_changes_key() {
        let a = params_of(&[("symbol", json!("rb2505")), ("period", json!("1d"))]);
        let b = params_of(&[("symbol", json!("rb2505")), ("period", json!("5m"))]);
        assert_ne!(fingerprint("history", &a), fingerprint("history", &b));
    }

    #[test]
    fn namespace_separates_identical_params() {
        let p = params_of(&[("symbol", json!("rb2505"))]);
        assert_ne!(fingerprint("history", &p), fingerprint("symbols", &p));
    }

    #[test]
    fn namespace_separation_over_random_sample() {
        // A coarse collision check: many generated parameter sets, two
        // namespaces each, all keys distinct.
        let mut seen = std::collections::HashSet::new();
        for i in 0..500 {
            let p = params_of(&[
                ("symbol", json!(format!("sym{i}"))),
                ("from", json!(i * 1000)),
            ]);
            assert!(seen.insert(fingerprint("history", &p)));
            assert!(seen.insert(fingerprint("symbols", &p)));
        }
        assert_eq!(seen.len(), 1000);
    }

    #[test]
    fn separator_in_value_cannot_spoof_namespace() {
        // Naive "ns:params" concatenation would let these collide.
        let a = params_of(&[("q", json!("x"))]);
        let b = params_of(&[("q", json!("history\"]x"))]);
        assert_ne!(fingerprint("history", &a), fingerprint("h", &b));
    }

    #[test]
    fn numeric_and_string_params_mix() {
        let a = params_of(&[("from", json!(0)), ("to", json!(1700000000000_i64))]);
        let b = params_of(&[("from", json!(0)), ("to", json!(1700000000001_i64))]);
        assert_ne!(fingerprint("history", &a), fingerprint("history", &b));
    }

    #[test]
    fn nested_object_values_are_key_sorted() {
        let a = params_of(&[("filter", json!({"a": 1, "b": 2}))]);
        let b = params_of(&[("filter", json!({"b": 2, "a": 1}))]);
        assert_eq!(fingerprint("history", &a), fingerprint("history", &b));
    }

    #[test]
    fn key_is_fixed_length_hex() {
        let p = params_of(&[("symbol", json!("rb2505"))]);
        let key = fingerprint("history", &p);
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
