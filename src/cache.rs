//! TTL cache for search results.
//!
//! Kept outside the pipeline as a decorator: the API layer consults it
//! before running a search and stores the outcome afterwards. Keys are a
//! short digest of the canonical params; `now` is supplied by the caller so
//! expiry is testable without sleeping.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::event::SearchParams;

/// Stable, short cache key for a search request.
pub fn cache_key(params: &SearchParams) -> String {
    use sha2::{Digest, Sha256};
    let canonical = serde_json::to_string(params).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(16);
    for b in digest.iter().take(8) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

pub struct TtlCache<V> {
    ttl: Duration,
    entries: RwLock<HashMap<String, Entry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Absolute TTL, no sliding refresh.
    pub fn get(&self, key: &str, now: Instant) -> Option<V> {
        let guard = self.entries.read().ok()?;
        let entry = guard.get(key)?;
        if now.duration_since(entry.inserted_at) < self.ttl {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    pub fn insert(&self, key: String, value: V, now: Instant) {
        if let Ok(mut guard) = self.entries.write() {
            guard.insert(
                key,
                Entry {
                    value,
                    inserted_at: now,
                },
            );
        }
    }

    /// Drop every expired entry; returns how many were removed.
    pub fn evict_expired(&self, now: Instant) -> usize {
        let Ok(mut guard) = self.entries.write() else {
            return 0;
        };
        let before = guard.len();
        guard.retain(|_, e| now.duration_since(e.inserted_at) < self.ttl);
        before - guard.len()
    }
}
