//! Cache Backend Trait
//!
//! The seam between the two-tier store and a single tier. Tiers deal in
//! JSON text; encoding and decoding happen in [`TieredCache`].
//!
//! [`TieredCache`]: crate::cache::TieredCache

use std::time::Duration;

use async_trait::async_trait;

use crate::cache::LocalStats;
use crate::error::{CacheError, CacheResult};

/// One cache tier.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Short name used in logs and stats
    fn name(&self) -> &'static str;

    /// Establishes the tier's connection, if it has one.
    async fn connect(&self) -> CacheResult<()> {
        Ok(())
    }

    /// Returns the stored value, `None` on a genuine miss.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value and TTL.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;

    /// Removes `key`. Returns whether an entry was present.
    async fn delete(&self, key: &str) -> CacheResult<bool>;

    /// Whether [`delete_pattern`](Self::delete_pattern) is implemented.
    fn supports_pattern_delete(&self) -> bool {
        false
    }

    /// Removes every key containing `pattern`. Returns the number removed.
    async fn delete_pattern(&self, pattern: &str) -> CacheResult<u64> {
        Err(CacheError::Unsupported(format!(
            "{} tier cannot delete by pattern '{}'",
            self.name(),
            pattern
        )))
    }

    /// Counters kept by the tier itself, when it keeps any.
    async fn stats_snapshot(&self) -> Option<LocalStats> {
        None
    }

    /// Flushes and releases the tier's resources.
    async fn close(&self) -> CacheResult<()> {
        Ok(())
    }
}

// == Disabled Store ==
/// Primary stand-in when no remote tier is configured.
///
/// Every operation fails, so the two-tier store always falls back to its
/// secondary.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledStore;

#[async_trait]
impl CacheBackend for DisabledStore {
    fn name(&self) -> &'static str {
        "disabled"
    }

    async fn get(&self, _key: &str) -> CacheResult<Option<String>> {
        Err(CacheError::Unavailable("no remote tier configured".to_string()))
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> CacheResult<()> {
        Err(CacheError::Unavailable("no remote tier configured".to_string()))
    }

    async fn delete(&self, _key: &str) -> CacheResult<bool> {
        Err(CacheError::Unavailable("no remote tier configured".to_string()))
    }
}
