//! TTL cache for provider payloads
//!
//! Keyed by `(data_type, provider, subject_id)`. An entry is live while its
//! age is at most the current TTL, so a shortened TTL applies to entries
//! already stored. Expiry is lazy: an expired entry is dropped when it is
//! next read, or by [`EnrichmentCache::purge_expired`].
//! Concurrent misses for the same key may both fetch; the later write wins.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use parking_lot::RwLock;
use riskgate_core::{Result, SharedClock};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::trace;

/// Cache key
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct CacheKey {
    /// Kind of data
    pub data_type: String,
    /// Provider name
    pub provider: String,
    /// Subject the data is about
    pub subject_id: String,
}

impl CacheKey {
    /// Build a key
    pub fn new(data_type: &str, provider: &str, subject_id: &str) -> Self {
        Self {
            data_type: data_type.to_string(),
            provider: provider.to_string(),
            subject_id: subject_id.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct CachedValue {
    value: Value,
    stored_at: DateTime<Utc>,
}

impl CachedValue {
    fn is_expired(&self, now: DateTime<Utc>, ttl: ChronoDuration) -> bool {
        now - self.stored_at > ttl
    }
}

/// Cache counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Entries currently held, expired or not
    pub entries: usize,
    /// Reads answered from the cache
    pub hits: u64,
    /// Reads that went to the provider
    pub misses: u64,
}

/// Unbounded TTL cache driven by the clock effect
#[derive(Debug)]
pub struct EnrichmentCache {
    entries: RwLock<HashMap<CacheKey, CachedValue>>,
    ttl: RwLock<ChronoDuration>,
    clock: SharedClock,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl EnrichmentCache {
    /// Create a cache whose entries live for `ttl`
    pub fn new(ttl: Duration, clock: SharedClock) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: RwLock::new(to_chrono(ttl)),
            clock,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Change the TTL, for new and already stored entries alike
    pub fn set_ttl(&self, ttl: Duration) {
        *self.ttl.write() = to_chrono(ttl);
    }

    /// Unexpired value under `key`; drops the entry if it has expired
    pub fn get(&self, key: &CacheKey) -> Option<Value> {
        let now = self.clock.now();
        let ttl = *self.ttl.read();
        {
            let entries = self.entries.read();
            match entries.get(key) {
                None => return None,
                Some(cached) if !cached.is_expired(now, ttl) => return Some(cached.value.clone()),
                Some(_) => {}
            }
        }
        let mut entries = self.entries.write();
        if entries.get(key).is_some_and(|cached| cached.is_expired(now, ttl)) {
            entries.remove(key);
            trace!(?key, "evicted expired enrichment entry");
        }
        None
    }

    /// Store `value` under `key`, aged from now
    pub fn insert(&self, key: CacheKey, value: Value) {
        let stored_at = self.clock.now();
        self.entries.write().insert(key, CachedValue { value, stored_at });
    }

    /// Cached value, or the result of `fetch` stored for next time
    ///
    /// Returns the value and whether it came from the cache. A failed fetch
    /// is not cached.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        data_type: &str,
        provider: &str,
        subject_id: &str,
        fetch: F,
    ) -> Result<(Value, bool)>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        let key = CacheKey::new(data_type, provider, subject_id);
        if let Some(value) = self.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok((value, true));
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        let value = fetch().await?;
        self.insert(key, value.clone());
        Ok((value, false))
    }

    /// Drop one entry; returns whether it existed
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        self.entries.write().remove(key).is_some()
    }

    /// Drop every expired entry; returns how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let ttl = *self.ttl.read();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, cached| !cached.is_expired(now, ttl));
        before - entries.len()
    }

    /// Drop everything
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Current counters
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.read().len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

fn to_chrono(ttl: Duration) -> ChronoDuration {
    ChronoDuration::from_std(ttl).unwrap_or_else(|_| ChronoDuration::weeks(52 * 100))
}
