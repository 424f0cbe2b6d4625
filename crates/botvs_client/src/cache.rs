//! In-memory memoization of RPC results.
//!
//! Entries are keyed by method, a digest of the calling access key and a
//! SHA-256 of the canonical args JSON. Clients signing with different keys
//! never see each other's results, and separators inside argument values
//! cannot make two calls collide. Staleness is checked on lookup; nothing is
//! evicted in the background.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tokio::time::Instant;

/// A cached result with the time it was fetched.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: Value,
    pub fetched_at: Instant,
}

impl CacheEntry {
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() < ttl
    }
}

/// Hex digits of the access-key digest kept in the key.
const OWNER_DIGEST_LEN: usize = 16;

/// Build the cache key for a call made with `access_key`.
pub fn cache_key(access_key: &str, method: &str, args_json: &str) -> String {
    let owner = format!("{:x}", Sha256::digest(access_key.as_bytes()));
    format!(
        "{}|{}|{:x}",
        method,
        &owner[..OWNER_DIGEST_LEN],
        Sha256::digest(args_json.as_bytes())
    )
}

/// Thread-safe result cache plus per-key in-flight locks.
#[derive(Debug, Default)]
pub struct RpcCache {
    entries: DashMap<String, CacheEntry>,
    in_flight: DashMap<String, Arc<Mutex<()>>>,
}

impl RpcCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached value for `key` if it is younger than `ttl`.
    pub fn get_fresh(&self, key: &str, ttl: Duration) -> Option<Value> {
        self.entries
            .get(key)
            .filter(|entry| entry.is_fresh(ttl))
            .map(|entry| entry.value.clone())
    }

    /// Store `value` as fetched now, replacing any previous entry.
    pub fn insert(&self, key: String, value: Value) {
        self.entries.insert(
            key,
            CacheEntry {
                value,
                fetched_at: Instant::now(),
            },
        );
    }

    /// Lock serializing live fetches for one key.
    pub fn flight_lock(&self, key: &str) -> Arc<Mutex<()>> {
        self.in_flight
            .entry(key.to_string())
            .or_default()
            .value()
            .clone()
    }

    /// Drop the flight lock for `key` once no other caller holds `lock`.
    ///
    /// Must be called while the caller still owns its clone of `lock`.
    pub fn release_flight(&self, key: &str, lock: &Arc<Mutex<()>>) {
        self.in_flight.remove_if(key, |_, held| {
            Arc::ptr_eq(held, lock) && Arc::strong_count(held) <= 2
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn pending_flights(&self) -> usize {
        self.in_flight.len()
    }
}
