//! Integration Tests for the Cache Layer
//!
//! Drives the public cache API the way an application would: wrapped data
//! access functions over a two-tier store.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use transit_cache::cache::mock::ScriptedBackend;
use transit_cache::cache::{
    build_key, cached, invalidate_cache, CacheOptions, DisabledStore, InvalidateOptions, KeyArgs,
    LocalStore, PatternInvalidation, TieredCache,
};

use common::memory_primary;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct RouteRow {
    id: u64,
    route_number: String,
}

fn tiers() -> (Arc<ScriptedBackend>, Arc<TieredCache>) {
    let primary = memory_primary();
    let cache = Arc::new(TieredCache::new(primary.clone(), Arc::new(LocalStore::new(50))));
    (primary, cache)
}

#[tokio::test]
async fn test_read_through_then_invalidate_by_prefix() {
    let (primary, cache) = tiers();
    let executions = Arc::new(AtomicUsize::new(0));
    let rows = Arc::new(std::sync::Mutex::new(vec![RouteRow {
        id: 1,
        route_number: "T5".to_string(),
    }]));

    let get_routes = {
        let executions = executions.clone();
        let rows = rows.clone();
        cached(
            cache.clone(),
            CacheOptions::new()
                .ttl(Duration::from_secs(1800))
                .prefix("routes:list"),
            move |_: ()| {
                executions.fetch_add(1, Ordering::SeqCst);
                let snapshot = rows.lock().unwrap().clone();
                async move { Ok::<_, String>(snapshot) }
            },
        )
    };

    let create_route = {
        let rows = rows.clone();
        invalidate_cache(
            cache.clone(),
            InvalidateOptions::new().prefix("routes"),
            move |row: RouteRow| {
                rows.lock().unwrap().push(row.clone());
                async move { Ok::<_, String>(row) }
            },
        )
    };

    assert_eq!(get_routes.call(()).await.unwrap().len(), 1);
    assert_eq!(get_routes.call(()).await.unwrap().len(), 1);
    assert_eq!(executions.load(Ordering::SeqCst), 1);
    assert!(primary.contains("routes:list"));

    create_route
        .call(RouteRow {
            id: 2,
            route_number: "T3".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(get_routes.call(()).await.unwrap().len(), 2);
    assert_eq!(executions.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_positional_and_named_keys() {
    let (primary, cache) = tiers();
    let nearby = cached(
        cache,
        CacheOptions::new().prefix("stops:nearby"),
        |args: KeyArgs| async move { Ok::<_, ()>(args.signature()) },
    );

    let args = KeyArgs::new()
        .arg(56.8389)
        .named("radius", 500)
        .named("limit", 10);
    nearby.call(args.clone()).await.unwrap();

    let key = nearby.key_for(&args);
    assert_eq!(key, "stops:nearby:56.8389:limit=10:radius=500");
    assert_eq!(key, build_key("stops:nearby", &args));
    assert!(primary.contains(&key));
}

#[tokio::test]
async fn test_long_parameters_are_hashed() {
    let (primary, cache) = tiers();
    let search = cached(
        cache,
        CacheOptions::new().prefix("search"),
        |query: String| async move { Ok::<_, ()>(query.len()) },
    );

    let query = "x".repeat(250);
    assert_eq!(search.call(query.clone()).await, Ok(250));

    let keys = primary.keys();
    assert_eq!(keys.len(), 1);
    assert_eq!(keys[0].len(), "search:".len() + 32);
    assert_eq!(keys[0], search.key_for(&query));
}

#[tokio::test]
async fn test_exact_key_invalidation() {
    let (primary, cache) = tiers();
    let detail = cached(
        cache.clone(),
        CacheOptions::new().prefix("routes:detail"),
        |id: u64| async move { Ok::<_, ()>(id * 10) },
    );
    let touch = invalidate_cache(
        cache,
        InvalidateOptions::new().key_function(|id: &u64| format!("routes:detail:{}", id)),
        |id: u64| async move { Ok::<_, ()>(id) },
    );

    detail.call(1).await.unwrap();
    detail.call(2).await.unwrap();
    touch.call(1).await.unwrap();

    assert!(!primary.contains("routes:detail:1"));
    assert!(primary.contains("routes:detail:2"));
}

#[tokio::test]
async fn test_outage_then_recovery() {
    let (primary, cache) = tiers();
    primary.set_online(false);

    assert!(cache.set("stops:list", &vec!["Central Station"], Duration::from_secs(60)).await);
    assert_eq!(
        cache.clear_pattern("stops").await,
        PatternInvalidation::Failed
    );

    primary.set_online(true);
    // The local copy written during the outage is still served.
    assert_eq!(
        cache.get::<Vec<String>>("stops:list").await,
        Some(vec!["Central Station".to_string()])
    );
    assert!(!primary.contains("stops:list"));
}

#[tokio::test]
async fn test_local_only_mode_cannot_clear_patterns() {
    let local = LocalStore::new(10);
    let cache = Arc::new(TieredCache::new(Arc::new(DisabledStore), Arc::new(local.clone())));

    assert!(!cache.supports_pattern_delete());
    cache.set("routes:list", &Vec::<u64>::new(), Duration::from_secs(60)).await;

    assert_eq!(cache.clear_pattern("routes").await, PatternInvalidation::Unsupported);
    assert!(cache.delete("routes:list").await);
    assert!(local.is_empty().await);
}
