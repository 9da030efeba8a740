//! Local Tier
//!
//! Process-local fallback tier: a bounded map with TTL expiry and LRU
//! eviction. It has no pattern-scan capability, so prefix invalidation never
//! reaches it and its entries live until they expire or are deleted by key.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::{CacheBackend, CacheEntry, LocalStats, LruTracker};
use crate::error::CacheResult;

// == Local Cache ==
/// Single-threaded core of the local tier.
#[derive(Debug)]
pub struct LocalCache {
    entries: HashMap<String, CacheEntry>,
    lru: LruTracker,
    stats: LocalStats,
    max_entries: usize,
}

impl LocalCache {
    /// Creates an empty cache holding at most `max_entries` (minimum 1).
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: LocalStats::new(),
            max_entries: max_entries.max(1),
        }
    }

    // == Set ==
    /// Stores `value` under `key` with a fresh TTL, evicting the least
    /// recently used entry when a new key would exceed capacity.
    pub fn set(&mut self, key: String, value: String, ttl: Duration) {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            if let Some(evicted) = self.lru.evict_oldest() {
                self.entries.remove(&evicted);
                self.stats.record_eviction();
                debug!(key = %evicted, "Local tier evicted entry");
            }
        }

        self.lru.touch(&key);
        self.entries.insert(key, CacheEntry::new(value, ttl));
        self.stats.set_entries(self.entries.len());
    }

    // == Get ==
    /// Returns the live value for `key`. Expired entries are dropped and
    /// counted as misses.
    pub fn get(&mut self, key: &str) -> Option<String> {
        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(),
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        if expired {
            self.remove(key);
            self.stats.record_expirations(1);
            self.stats.record_miss();
            return None;
        }

        self.stats.record_hit();
        self.lru.touch(key);
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    // == Delete ==
    /// Removes `key`, returning whether it was present.
    pub fn delete(&mut self, key: &str) -> bool {
        self.remove(key)
    }

    // == Cleanup Expired ==
    /// Removes all expired entries and returns how many were dropped.
    pub fn cleanup_expired(&mut self) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.remove(key);
        }

        self.stats.record_expirations(expired.len());
        expired.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
        self.stats.set_entries(0);
    }

    pub fn stats(&self) -> LocalStats {
        let mut stats = self.stats.clone();
        stats.set_entries(self.entries.len());
        stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn remove(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        self.lru.remove(key);
        self.stats.set_entries(self.entries.len());
        removed
    }
}

// == Local Store ==
/// Shareable handle to the local tier. Clones share the same entries.
#[derive(Debug, Clone)]
pub struct LocalStore {
    inner: Arc<RwLock<LocalCache>>,
}

impl LocalStore {
    pub fn new(max_entries: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(LocalCache::new(max_entries))),
        }
    }

    /// Purges expired entries; used by the background sweeper.
    pub async fn cleanup_expired(&self) -> usize {
        self.inner.write().await.cleanup_expired()
    }

    pub async fn stats(&self) -> LocalStats {
        self.inner.read().await.stats()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl CacheBackend for LocalStore {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        // Write lock: reads update recency and may drop an expired entry.
        Ok(self.inner.write().await.get(key))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        self.inner
            .write()
            .await
            .set(key.to_string(), value.to_string(), ttl);
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        Ok(self.inner.write().await.delete(key))
    }

    async fn stats_snapshot(&self) -> Option<LocalStats> {
        Some(self.stats().await)
    }

    async fn close(&self) -> CacheResult<()> {
        self.inner.write().await.clear();
        Ok(())
    }
}
