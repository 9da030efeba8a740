//! Catalog Service
//!
//! Catalog operations fronted by the cache. Reads go through [`cached`]
//! wrappers; writes go through [`invalidate_cache`] wrappers that clear every
//! cached key of the affected entity family once the write succeeds.
//! Validation happens inside the wrapped functions, so a rejected request
//! never invalidates anything.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::{
    cached, invalidate_cache, CacheOptions, Cached, InvalidateOptions, Invalidating, TieredCache,
};
use crate::catalog::TransitCatalog;
use crate::error::{ApiError, Result};
use crate::models::{Route, RouteFilter, RouteRequest, Stop, StopRequest};

/// Pattern cleared by route writes; covers list and detail keys.
pub const ROUTES_PREFIX: &str = "routes";
pub const ROUTES_LIST_PREFIX: &str = "routes:list";
pub const ROUTES_DETAIL_PREFIX: &str = "routes:detail";
/// Pattern cleared by stop writes.
pub const STOPS_PREFIX: &str = "stops";
pub const STOPS_LIST_PREFIX: &str = "stops:list";

/// Cache lifetimes per entity family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogTtls {
    pub routes: Duration,
    pub stops: Duration,
}

impl Default for CatalogTtls {
    fn default() -> Self {
        Self {
            routes: Duration::from_secs(30 * 60),
            stops: Duration::from_secs(60 * 60),
        }
    }
}

/// Options for a write that clears every key containing `prefix`.
fn invalidates<A>(prefix: &str) -> InvalidateOptions<A> {
    InvalidateOptions::new().prefix(prefix)
}

#[derive(Clone)]
pub struct CatalogService {
    catalog: Arc<TransitCatalog>,
    list_routes: Cached<RouteFilter, Vec<Route>, ApiError>,
    get_route: Cached<u64, Route, ApiError>,
    create_route: Invalidating<RouteRequest, Route, ApiError>,
    update_route: Invalidating<(u64, RouteRequest), Route, ApiError>,
    delete_route: Invalidating<u64, (), ApiError>,
    list_stops: Cached<(), Vec<Stop>, ApiError>,
    create_stop: Invalidating<StopRequest, Stop, ApiError>,
    delete_stop: Invalidating<u64, (), ApiError>,
}

impl CatalogService {
    pub fn new(catalog: Arc<TransitCatalog>, cache: Arc<TieredCache>, ttls: CatalogTtls) -> Self {
        let list_routes = {
            let catalog = Arc::clone(&catalog);
            cached(
                Arc::clone(&cache),
                CacheOptions::new()
                    .ttl(ttls.routes)
                    .prefix(ROUTES_LIST_PREFIX),
                move |filter: RouteFilter| {
                    let catalog = Arc::clone(&catalog);
                    async move { Ok::<_, ApiError>(catalog.list_routes(&filter).await) }
                },
            )
        };

        let get_route = {
            let catalog = Arc::clone(&catalog);
            cached(
                Arc::clone(&cache),
                CacheOptions::new()
                    .ttl(ttls.routes)
                    .prefix(ROUTES_DETAIL_PREFIX),
                move |id: u64| {
                    let catalog = Arc::clone(&catalog);
                    async move {
                        catalog
                            .get_route(id)
                            .await
                            .ok_or_else(|| ApiError::NotFound(format!("Route {}", id)))
                    }
                },
            )
        };

        let create_route = {
            let catalog = Arc::clone(&catalog);
            invalidate_cache(
                Arc::clone(&cache),
                invalidates(ROUTES_PREFIX),
                move |req: RouteRequest| {
                    let catalog = Arc::clone(&catalog);
                    async move {
                        validate(req.validate())?;
                        Ok::<_, ApiError>(catalog.create_route(req).await)
                    }
                },
            )
        };

        let update_route = {
            let catalog = Arc::clone(&catalog);
            invalidate_cache(
                Arc::clone(&cache),
                invalidates(ROUTES_PREFIX),
                move |(id, req): (u64, RouteRequest)| {
                    let catalog = Arc::clone(&catalog);
                    async move {
                        validate(req.validate())?;
                        catalog
                            .update_route(id, req)
                            .await
                            .ok_or_else(|| ApiError::NotFound(format!("Route {}", id)))
                    }
                },
            )
        };

        let delete_route = {
            let catalog = Arc::clone(&catalog);
            invalidate_cache(Arc::clone(&cache), invalidates(ROUTES_PREFIX), move |id: u64| {
                let catalog = Arc::clone(&catalog);
                async move {
                    if catalog.delete_route(id).await {
                        Ok(())
                    } else {
                        Err(ApiError::NotFound(format!("Route {}", id)))
                    }
                }
            })
        };

        let list_stops = {
            let catalog = Arc::clone(&catalog);
            cached(
                Arc::clone(&cache),
                CacheOptions::new().ttl(ttls.stops).prefix(STOPS_LIST_PREFIX),
                move |_: ()| {
                    let catalog = Arc::clone(&catalog);
                    async move { Ok::<_, ApiError>(catalog.list_stops().await) }
                },
            )
        };

        let create_stop = {
            let catalog = Arc::clone(&catalog);
            invalidate_cache(
                Arc::clone(&cache),
                invalidates(STOPS_PREFIX),
                move |req: StopRequest| {
                    let catalog = Arc::clone(&catalog);
                    async move {
                        validate(req.validate())?;
                        Ok::<_, ApiError>(catalog.create_stop(req).await)
                    }
                },
            )
        };

        let delete_stop = {
            let catalog = Arc::clone(&catalog);
            invalidate_cache(cache, invalidates(STOPS_PREFIX), move |id: u64| {
                let catalog = Arc::clone(&catalog);
                async move {
                    if catalog.delete_stop(id).await {
                        Ok(())
                    } else {
                        Err(ApiError::NotFound(format!("Stop {}", id)))
                    }
                }
            })
        };

        Self {
            catalog,
            list_routes,
            get_route,
            create_route,
            update_route,
            delete_route,
            list_stops,
            create_stop,
            delete_stop,
        }
    }

    /// Underlying catalog, bypassing the cache.
    pub fn catalog(&self) -> &Arc<TransitCatalog> {
        &self.catalog
    }

    // == Routes ==
    pub async fn list_routes(&self, filter: RouteFilter) -> Result<Vec<Route>> {
        self.list_routes.call(filter).await
    }

    pub async fn get_route(&self, id: u64) -> Result<Route> {
        self.get_route.call(id).await
    }

    pub async fn create_route(&self, req: RouteRequest) -> Result<Route> {
        self.create_route.call(req).await
    }

    pub async fn update_route(&self, id: u64, req: RouteRequest) -> Result<Route> {
        self.update_route.call((id, req)).await
    }

    pub async fn delete_route(&self, id: u64) -> Result<()> {
        self.delete_route.call(id).await
    }

    // == Stops ==
    pub async fn list_stops(&self) -> Result<Vec<Stop>> {
        self.list_stops.call(()).await
    }

    pub async fn create_stop(&self, req: StopRequest) -> Result<Stop> {
        self.create_stop.call(req).await
    }

    pub async fn delete_stop(&self, id: u64) -> Result<()> {
        self.delete_stop.call(id).await
    }
}

fn validate(problem: Option<String>) -> Result<()> {
    match problem {
        Some(msg) => Err(ApiError::InvalidRequest(msg)),
        None => Ok(()),
    }
}
