//! In-memory TTL cache for upstream search responses.
//!
//! Search results change slowly relative to how often the UI re-issues
//! the same query (tab switches, infinite-scroll re-renders), so even a
//! short TTL removes most upstream calls. Expiry is lazy: entries are
//! checked on lookup and swept occasionally on insert, no background
//! task needed.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Sweep expired entries once the map grows past this many keys.
const PRUNE_THRESHOLD: usize = 256;

/// A cached response body with an expiration time.
struct CacheEntry {
    body: String,
    expires_at: Instant,
}

impl CacheEntry {
    fn new(body: String, ttl: Duration) -> Self {
        Self {
            body,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    fn get(&self) -> Option<String> {
        if self.is_expired() {
            None
        } else {
            Some(self.body.clone())
        }
    }
}

/// TTL cache keyed by the request fields that determine the response.
pub struct SearchCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl SearchCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Build a cache key from the request fields.
    ///
    /// The fields are JSON-serialized as a tuple, so the encoding is
    /// unambiguous: identical fields always produce identical keys, and
    /// no value of one field can masquerade as another.
    pub fn key(query: &str, page_token: Option<&str>, limit: u32) -> String {
        serde_json::to_string(&(query, page_token, limit)).unwrap_or_default()
    }

    /// Get a live cached body, or None if missing or expired.
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .ok()
            .and_then(|guard| guard.get(key).and_then(|e| e.get()))
    }

    /// Store a response body under the key with a fresh timestamp.
    ///
    /// Overwrites any previous entry for the key.
    pub fn put(&self, key: String, body: String) {
        if let Ok(mut guard) = self.entries.write() {
            guard.insert(key, CacheEntry::new(body, self.ttl));
            if guard.len() > PRUNE_THRESHOLD {
                guard.retain(|_, entry| !entry.is_expired());
            }
        }
    }
}
