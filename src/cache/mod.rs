//! Cache Module
//!
//! Two-tier cache-aside layer: a shared remote tier backed by Redis with a
//! process-local fallback tier, plus the wrappers that put it in front of
//! async data-access functions.

mod backend;
mod entry;
mod key;
mod local;
mod lru;
mod redis_store;
mod stats;
mod tiered;
mod wrappers;

#[cfg(any(test, feature = "test-util"))]
pub mod mock;

// Re-export public types
pub use backend::{CacheBackend, DisabledStore};
pub use entry::CacheEntry;
pub use key::{build_key, IntoKeyArgs, KeyArgs, HASH_LEN, MAX_PARAMS_LEN};
pub use local::{LocalCache, LocalStore};
pub use lru::LruTracker;
pub use redis_store::{RedisStore, RedisStoreConfig};
pub use stats::LocalStats;
pub use tiered::{PatternInvalidation, TierStats, TieredCache};
pub use wrappers::{
    cached, invalidate_cache, CacheOptions, Cached, InvalidateOptions, Invalidating, KeyFunction,
    DEFAULT_TTL,
};
