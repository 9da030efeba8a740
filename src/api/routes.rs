//! API Routes
//!
//! Configures the Axum router with all transit API endpoints.

use axum::{
    routing::{delete, get},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    cache_stats_handler, create_route_handler, create_stop_handler, delete_route_handler,
    delete_stop_handler, get_route_handler, health_handler, list_routes_handler,
    list_stops_handler, update_route_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /health` - Health check endpoint
/// - `GET /cache/stats` - Two-tier cache statistics
/// - `GET|POST /routes` - List (cached) or create routes
/// - `GET|PUT|DELETE /routes/:id` - Fetch (cached), replace or delete a route
/// - `GET|POST /stops` - List (cached) or create stops
/// - `DELETE /stops/:id` - Delete a stop
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/cache/stats", get(cache_stats_handler))
        .route("/routes", get(list_routes_handler).post(create_route_handler))
        .route(
            "/routes/:id",
            get(get_route_handler)
                .put(update_route_handler)
                .delete(delete_route_handler),
        )
        .route("/stops", get(list_stops_handler).post(create_stop_handler))
        .route("/stops/:id", delete(delete_stop_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
