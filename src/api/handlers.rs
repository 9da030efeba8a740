//! API Handlers
//!
//! HTTP request handlers for each transit API endpoint. Handlers only move
//! data between HTTP and the catalog service; caching happens below them.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::cache::{TierStats, TieredCache};
use crate::catalog::CatalogService;
use crate::error::Result;
use crate::models::{
    DeleteResponse, HealthResponse, Route, RouteFilter, RouteRequest, Stop, StopRequest,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Cached catalog operations
    pub service: CatalogService,
    /// The store behind the service, for stats and health
    pub cache: Arc<TieredCache>,
}

impl AppState {
    pub fn new(service: CatalogService, cache: Arc<TieredCache>) -> Self {
        Self { service, cache }
    }
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.cache.supports_pattern_delete()))
}

/// Handler for GET /cache/stats
pub async fn cache_stats_handler(State(state): State<AppState>) -> Json<TierStats> {
    Json(state.cache.stats().await)
}

// == Routes ==
/// Handler for GET /routes
pub async fn list_routes_handler(
    State(state): State<AppState>,
    Query(filter): Query<RouteFilter>,
) -> Result<Json<Vec<Route>>> {
    Ok(Json(state.service.list_routes(filter).await?))
}

/// Handler for GET /routes/:id
pub async fn get_route_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Route>> {
    Ok(Json(state.service.get_route(id).await?))
}

/// Handler for POST /routes
pub async fn create_route_handler(
    State(state): State<AppState>,
    Json(req): Json<RouteRequest>,
) -> Result<(StatusCode, Json<Route>)> {
    let route = state.service.create_route(req).await?;
    Ok((StatusCode::CREATED, Json(route)))
}

/// Handler for PUT /routes/:id
pub async fn update_route_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(req): Json<RouteRequest>,
) -> Result<Json<Route>> {
    Ok(Json(state.service.update_route(id, req).await?))
}

/// Handler for DELETE /routes/:id
pub async fn delete_route_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<DeleteResponse>> {
    state.service.delete_route(id).await?;
    Ok(Json(DeleteResponse::new("Route", id)))
}

// == Stops ==
/// Handler for GET /stops
pub async fn list_stops_handler(State(state): State<AppState>) -> Result<Json<Vec<Stop>>> {
    Ok(Json(state.service.list_stops().await?))
}

/// Handler for POST /stops
pub async fn create_stop_handler(
    State(state): State<AppState>,
    Json(req): Json<StopRequest>,
) -> Result<(StatusCode, Json<Stop>)> {
    let stop = state.service.create_stop(req).await?;
    Ok((StatusCode::CREATED, Json(stop)))
}

/// Handler for DELETE /stops/:id
pub async fn delete_stop_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<DeleteResponse>> {
    state.service.delete_stop(id).await?;
    Ok(Json(DeleteResponse::new("Stop", id)))
}
