//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{body::Body, Router};
use serde_json::Value;

use transit_cache::api::create_router;
use transit_cache::cache::mock::ScriptedBackend;
use transit_cache::cache::{LocalStore, TieredCache};
use transit_cache::catalog::{CatalogService, CatalogTtls, TransitCatalog};
use transit_cache::AppState;

/// Shared-store stand-in: pattern deletes and a switchable outage.
pub fn memory_primary() -> Arc<ScriptedBackend> {
    Arc::new(ScriptedBackend::new("memory", true))
}

// == App Fixture ==
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub primary: Arc<ScriptedBackend>,
    pub local: LocalStore,
}

impl TestApp {
    /// Seeded catalog behind a memory primary and a local fallback.
    pub async fn new() -> Self {
        let primary = memory_primary();
        let local = LocalStore::new(100);
        let cache = Arc::new(TieredCache::new(primary.clone(), Arc::new(local.clone())));
        let catalog = Arc::new(TransitCatalog::with_seed_data().await);
        let service = CatalogService::new(catalog, cache.clone(), CatalogTtls::default());
        let state = AppState::new(service, cache);

        Self {
            router: create_router(state.clone()),
            state,
            primary,
            local,
        }
    }

    pub fn query_count(&self) -> u64 {
        self.state.service.catalog().query_count()
    }
}

pub async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
