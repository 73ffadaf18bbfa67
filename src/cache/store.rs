//! Response cache storing JSON payloads with per-entry expiry
//!
//! Provides a `ResponseCache` that holds serializable data in memory with
//! insertion timestamps, supporting lazy expiry on read and eager
//! invalidation by key prefix.

use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Default time-to-live for cache entries in minutes
pub const DEFAULT_TTL_MINUTES: i64 = 5;

/// A single cached response with its insertion time and expiry window
#[derive(Debug)]
struct CacheEntry {
    /// The cached payload, opaque to the cache
    data: serde_json::Value,
    /// When the data was stored
    stored_at: DateTime<Utc>,
    /// How long after `stored_at` the entry stays fresh
    ttl: Duration,
}

/// In-memory key-value store with per-entry TTL and prefix invalidation
///
/// The cache is process-local and never persisted. Keys are expected to be
/// built deterministically from a resource identifier plus a canonical
/// serialization of the query parameters, so identical requests map to
/// identical keys and differing parameters never collide.
///
/// Concurrent misses for the same key are not deduplicated: each caller
/// fetches independently and the last `set` wins.
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ResponseCache {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CacheEntry>> {
        // Map operations cannot leave an entry half-written, so a poisoned
        // lock is safe to recover from.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reads a value from the cache
    ///
    /// Returns `None` if the key is missing or the entry has outlived its
    /// TTL. Expired entries are removed on read, so a stale value is never
    /// returned and never resurrected by a later call.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut entries = self.lock();
        let entry = entries.get(key)?;

        if Utc::now() - entry.stored_at > entry.ttl {
            entries.remove(key);
            return None;
        }

        serde_json::from_value(entry.data.clone()).ok()
    }

    /// Stores a value with the default TTL, overwriting any existing entry
    pub fn set<T: Serialize>(&self, key: &str, data: &T) -> serde_json::Result<()> {
        self.set_with_ttl(key, data, Duration::minutes(DEFAULT_TTL_MINUTES))
    }

    /// Stores a value with an explicit TTL, overwriting any existing entry
    ///
    /// The entry is stamped with the current time; a repeated `set` for the
    /// same key restarts the expiry window.
    pub fn set_with_ttl<T: Serialize>(
        &self,
        key: &str,
        data: &T,
        ttl: Duration,
    ) -> serde_json::Result<()> {
        let data = serde_json::to_value(data)?;
        self.lock().insert(
            key.to_string(),
            CacheEntry {
                data,
                stored_at: Utc::now(),
                ttl,
            },
        );
        Ok(())
    }

    /// Removes every entry whose key starts with the given prefix
    ///
    /// Used after a mutating operation so subsequent reads of the affected
    /// resource bypass the cache. No-op if nothing matches; calling it twice
    /// has the same effect as calling it once.
    pub fn invalidate(&self, prefix: &str) {
        self.lock().retain(|key, _| !key.starts_with(prefix));
    }

    /// Backdates an entry's insertion time, simulating the passage of time
    #[cfg(test)]
    pub(crate) fn backdate(&self, key: &str, by: Duration) {
        if let Some(entry) = self.lock().get_mut(key) {
            entry.stored_at = entry.stored_at - by;
        }
    }
}
