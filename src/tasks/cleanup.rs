//! Local Tier Sweeper
//!
//! Background task that periodically drops expired entries from the local
//! tier. Reads already skip expired entries; the sweep only reclaims memory
//! held by keys nobody reads again.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::LocalStore;

/// Spawns a background task that purges expired local-tier entries.
///
/// # Arguments
/// * `local` - handle to the local tier; clones share its entries
/// * `cleanup_interval_secs` - seconds between sweeps (minimum 1)
///
/// # Returns
/// A JoinHandle for the spawned task, aborted during graceful shutdown.
pub fn spawn_cleanup_task(local: LocalStore, cleanup_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            interval_secs = interval.as_secs(),
            "Starting local cache sweeper"
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = local.cleanup_expired().await;
            if removed > 0 {
                info!(removed, "Local cache sweep removed expired entries");
            } else {
                debug!("Local cache sweep found no expired entries");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheBackend;

    #[tokio::test]
    async fn test_cleanup_task_removes_expired_entries() {
        let local = LocalStore::new(100);
        local
            .set("routes:list", "[]", Duration::from_secs(1))
            .await
            .unwrap();

        let handle = spawn_cleanup_task(local.clone(), 1);
        tokio::time::sleep(Duration::from_millis(2500)).await;

        assert!(local.is_empty().await, "Expired entry should have been swept");
        assert_eq!(local.stats().await.expirations, 1);

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_preserves_valid_entries() {
        let local = LocalStore::new(100);
        local
            .set("stops:list", "[]", Duration::from_secs(3600))
            .await
            .unwrap();

        let handle = spawn_cleanup_task(local.clone(), 1);
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(
            local.get("stops:list").await.unwrap(),
            Some("[]".to_string())
        );

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let handle = spawn_cleanup_task(LocalStore::new(10), 1);

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
