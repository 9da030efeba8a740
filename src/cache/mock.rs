//! In-memory tier with a switchable outage, for tests.
//!
//! Compiled for unit tests and behind the `test-util` feature, which the
//! integration tests enable.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::cache::CacheBackend;
use crate::error::{CacheError, CacheResult};

/// TTLs are ignored; entries live until deleted. Pattern deletes, when
/// enabled, remove every key containing the pattern as a substring.
pub struct ScriptedBackend {
    name: &'static str,
    patterns: bool,
    online: AtomicBool,
    reads: AtomicU64,
    entries: Mutex<HashMap<String, String>>,
}

impl ScriptedBackend {
    pub fn new(name: &'static str, patterns: bool) -> Self {
        Self {
            name,
            patterns,
            online: AtomicBool::new(true),
            reads: AtomicU64::new(0),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn insert(&self, key: &str, value: &str) {
        self.entries().insert(key.to_string(), value.to_string());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries().contains_key(key)
    }

    /// Stored keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.entries().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check(&self) -> CacheResult<()> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(CacheError::Unavailable(format!("{} is down", self.name)))
        }
    }
}

#[async_trait]
impl CacheBackend for ScriptedBackend {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.entries().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str, _ttl: Duration) -> CacheResult<()> {
        self.check()?;
        self.insert(key, value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        self.check()?;
        Ok(self.entries().remove(key).is_some())
    }

    fn supports_pattern_delete(&self) -> bool {
        self.patterns
    }

    async fn delete_pattern(&self, pattern: &str) -> CacheResult<u64> {
        if !self.patterns {
            return Err(CacheError::Unsupported(format!(
                "{} tier cannot delete by pattern '{}'",
                self.name, pattern
            )));
        }
        self.check()?;
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|key, _| !key.contains(pattern));
        Ok((before - entries.len()) as u64)
    }
}
