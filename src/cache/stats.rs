//! Local Tier Statistics
//!
//! Hit, miss, eviction and expiry counters kept by the local tier, reported
//! under `secondary` by `/cache/stats`.

use serde::ser::{Serialize, SerializeStruct, Serializer};

// == Local Stats ==
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocalStats {
    /// Reads that found a live entry
    pub hits: u64,
    /// Reads that found nothing or an expired entry
    pub misses: u64,
    /// Entries dropped to stay within capacity
    pub evictions: u64,
    /// Expired entries removed on read or by the sweeper
    pub expirations: u64,
    /// Entries currently held
    pub entries: usize,
}

impl LocalStats {
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// hits / (hits + misses), or 0.0 before any read.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_expirations(&mut self, count: usize) {
        self.expirations += count as u64;
    }

    pub fn set_entries(&mut self, count: usize) {
        self.entries = count;
    }
}

impl Serialize for LocalStats {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("LocalStats", 6)?;
        state.serialize_field("hits", &self.hits)?;
        state.serialize_field("misses", &self.misses)?;
        state.serialize_field("evictions", &self.evictions)?;
        state.serialize_field("expirations", &self.expirations)?;
        state.serialize_field("entries", &self.entries)?;
        state.serialize_field("hit_rate", &self.hit_rate())?;
        state.end()
    }
}
