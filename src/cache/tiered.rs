//! Two-Tier Cache Store
//!
//! Primary (remote, shared) tier with a secondary (process-local) fallback.
//! Every operation tries the primary first. Tier failures are logged and
//! absorbed: callers only ever see a miss or a `false` outcome, so an outage
//! of the primary degrades to per-process caching rather than no caching.
//!
//! Values are stored as JSON text. Writes that fail over to the secondary
//! leave the primary stale or empty for that key until the next write; there
//! is no cross-tier consistency beyond last-write-wins per tier.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error, info, warn};

use crate::cache::{CacheBackend, LocalStats};

// == Pattern Invalidation Outcome ==
/// Result of [`TieredCache::clear_pattern`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PatternInvalidation {
    /// Primary removed `removed` matching keys
    Cleared { removed: u64 },
    /// Primary has no pattern-delete capability; entries may stay stale
    Unsupported,
    /// Primary supports pattern deletes but the call failed
    Failed,
}

impl PatternInvalidation {
    pub fn is_success(&self) -> bool {
        matches!(self, PatternInvalidation::Cleared { .. })
    }
}

// == Tier Stats ==
/// Snapshot of the store's counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierStats {
    pub primary_tier: &'static str,
    pub secondary_tier: &'static str,
    pub primary_hits: u64,
    pub secondary_hits: u64,
    pub misses: u64,
    pub primary_errors: u64,
    pub secondary_errors: u64,
    /// Writes the primary refused that landed in the secondary
    pub fallback_writes: u64,
    pub deletes: u64,
    pub pattern_invalidations: u64,
    /// The secondary's own counters, when it keeps them
    pub secondary: Option<LocalStats>,
    pub hit_rate: f64,
}

#[derive(Debug, Default)]
struct Counters {
    primary_hits: AtomicU64,
    secondary_hits: AtomicU64,
    misses: AtomicU64,
    primary_errors: AtomicU64,
    secondary_errors: AtomicU64,
    fallback_writes: AtomicU64,
    deletes: AtomicU64,
    pattern_invalidations: AtomicU64,
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

// == Tiered Cache ==
/// Two-tier cache store. Construct once at startup and share as
/// `Arc<TieredCache>`.
pub struct TieredCache {
    primary: Arc<dyn CacheBackend>,
    secondary: Arc<dyn CacheBackend>,
    counters: Counters,
}

impl TieredCache {
    pub fn new(primary: Arc<dyn CacheBackend>, secondary: Arc<dyn CacheBackend>) -> Self {
        Self {
            primary,
            secondary,
            counters: Counters::default(),
        }
    }

    // == Lifecycle ==
    /// Connects both tiers. A tier that cannot connect is logged and left to
    /// retry on its next operation.
    pub async fn connect(&self) {
        for tier in [&self.primary, &self.secondary] {
            match tier.connect().await {
                Ok(()) => info!(tier = tier.name(), "Cache tier ready"),
                Err(err) => warn!(tier = tier.name(), error = %err, "Cache tier not reachable at startup"),
            }
        }
    }

    /// Flushes and closes both tiers.
    pub async fn shutdown(&self) {
        for tier in [&self.primary, &self.secondary] {
            if let Err(err) = tier.close().await {
                error!(tier = tier.name(), error = %err, "Failed to close cache tier");
            }
        }
        info!("Cache tiers closed");
    }

    pub fn supports_pattern_delete(&self) -> bool {
        self.primary.supports_pattern_delete()
    }

    // == Set ==
    /// Writes `value` to the primary, falling back to the secondary.
    /// Returns whether either tier accepted it.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) -> bool {
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(err) => {
                error!(key = %key, error = %err, "Failed to serialize cache value");
                return false;
            }
        };

        match self.primary.set(key, &payload, ttl).await {
            Ok(()) => {
                debug!(key = %key, tier = self.primary.name(), ttl_secs = ttl.as_secs(), "Cached value");
                return true;
            }
            Err(err) => {
                bump(&self.counters.primary_errors);
                error!(key = %key, tier = self.primary.name(), error = %err, "Failed to cache value in primary tier");
            }
        }

        match self.secondary.set(key, &payload, ttl).await {
            Ok(()) => {
                bump(&self.counters.fallback_writes);
                debug!(key = %key, tier = self.secondary.name(), ttl_secs = ttl.as_secs(), "Cached value");
                true
            }
            Err(err) => {
                bump(&self.counters.secondary_errors);
                error!(key = %key, tier = self.secondary.name(), error = %err, "Failed to cache value in secondary tier");
                false
            }
        }
    }

    // == Get ==
    /// Reads the primary, then the secondary on a primary miss or failure.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.primary.get(key).await {
            Ok(Some(payload)) => match serde_json::from_str(&payload) {
                Ok(value) => {
                    bump(&self.counters.primary_hits);
                    debug!(key = %key, tier = self.primary.name(), "Cache hit");
                    return Some(value);
                }
                Err(err) => {
                    bump(&self.counters.primary_errors);
                    error!(key = %key, tier = self.primary.name(), error = %err, "Failed to decode cached value");
                }
            },
            Ok(None) => debug!(key = %key, tier = self.primary.name(), "Cache miss"),
            Err(err) => {
                bump(&self.counters.primary_errors);
                error!(key = %key, tier = self.primary.name(), error = %err, "Failed to read primary tier");
            }
        }

        match self.secondary.get(key).await {
            Ok(Some(payload)) => match serde_json::from_str(&payload) {
                Ok(value) => {
                    bump(&self.counters.secondary_hits);
                    debug!(key = %key, tier = self.secondary.name(), "Cache hit");
                    Some(value)
                }
                Err(err) => {
                    bump(&self.counters.secondary_errors);
                    bump(&self.counters.misses);
                    error!(key = %key, tier = self.secondary.name(), error = %err, "Failed to decode cached value");
                    None
                }
            },
            Ok(None) => {
                bump(&self.counters.misses);
                debug!(key = %key, tier = self.secondary.name(), "Cache miss");
                None
            }
            Err(err) => {
                bump(&self.counters.secondary_errors);
                bump(&self.counters.misses);
                error!(key = %key, tier = self.secondary.name(), error = %err, "Failed to read secondary tier");
                None
            }
        }
    }

    /// Like [`get`](Self::get), returning `default` on a miss.
    pub async fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).await.unwrap_or(default)
    }

    // == Delete ==
    /// Deletes `key` from both tiers independently. Returns whether either
    /// deletion went through, whether or not the key existed.
    pub async fn delete(&self, key: &str) -> bool {
        let mut success = false;

        let tiers = [
            (&self.primary, &self.counters.primary_errors),
            (&self.secondary, &self.counters.secondary_errors),
        ];

        for (tier, errors) in tiers {
            match tier.delete(key).await {
                Ok(existed) => {
                    debug!(key = %key, tier = tier.name(), existed, "Deleted cache key");
                    success = true;
                }
                Err(err) => {
                    bump(errors);
                    error!(key = %key, tier = tier.name(), error = %err, "Failed to delete cache key");
                }
            }
        }

        if success {
            bump(&self.counters.deletes);
        }
        success
    }

    // == Clear Pattern ==
    /// Deletes every primary key containing `pattern`. The secondary is never
    /// scanned, so entries it took during an outage survive until they
    /// expire.
    pub async fn clear_pattern(&self, pattern: &str) -> PatternInvalidation {
        if !self.primary.supports_pattern_delete() {
            warn!(pattern = %pattern, tier = self.primary.name(), "Cache tier cannot delete by pattern");
            return PatternInvalidation::Unsupported;
        }

        match self.primary.delete_pattern(pattern).await {
            Ok(removed) => {
                bump(&self.counters.pattern_invalidations);
                debug!(pattern = %pattern, removed, "Cleared cache pattern");
                PatternInvalidation::Cleared { removed }
            }
            Err(err) => {
                bump(&self.counters.primary_errors);
                error!(pattern = %pattern, tier = self.primary.name(), error = %err, "Failed to clear cache pattern");
                PatternInvalidation::Failed
            }
        }
    }

    // == Stats ==
    pub async fn stats(&self) -> TierStats {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        let primary_hits = load(&self.counters.primary_hits);
        let secondary_hits = load(&self.counters.secondary_hits);
        let misses = load(&self.counters.misses);
        let lookups = primary_hits + secondary_hits + misses;

        TierStats {
            primary_tier: self.primary.name(),
            secondary_tier: self.secondary.name(),
            primary_hits,
            secondary_hits,
            misses,
            primary_errors: load(&self.counters.primary_errors),
            secondary_errors: load(&self.counters.secondary_errors),
            fallback_writes: load(&self.counters.fallback_writes),
            deletes: load(&self.counters.deletes),
            pattern_invalidations: load(&self.counters.pattern_invalidations),
            secondary: self.secondary.stats_snapshot().await,
            hit_rate: if lookups == 0 {
                0.0
            } else {
                (primary_hits + secondary_hits) as f64 / lookups as f64
            },
        }
    }
}
