//! Transit Catalog
//!
//! In-memory system of record for routes and stops. Stands in for the
//! database behind the cache: every read bumps a query counter so callers
//! can observe whether the cache absorbed a request.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::models::{Route, RouteFilter, RouteRequest, Stop, StopRequest, TransportType};

#[derive(Debug, Default)]
pub struct TransitCatalog {
    routes: RwLock<BTreeMap<u64, Route>>,
    stops: RwLock<BTreeMap<u64, Stop>>,
    next_route_id: AtomicU64,
    next_stop_id: AtomicU64,
    queries: AtomicU64,
}

impl TransitCatalog {
    /// Creates an empty catalog. Ids start at 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog holding the starter network of trams and buses.
    pub async fn with_seed_data() -> Self {
        let catalog = Self::new();

        let routes = [
            ("T5", "West Mall - Central Station - East Station", TransportType::Tram, "Every 8 min"),
            ("T3", "North Square - City Center - South Terminal", TransportType::Tram, "Every 10 min"),
            ("123", "Central Station - University - Shopping Mall", TransportType::Bus, "Every 15 min"),
            ("456", "South Terminal - East Station - North Square", TransportType::Bus, "Every 20 min"),
        ];
        for (route_number, name, transport_type, frequency) in routes {
            catalog
                .create_route(RouteRequest {
                    route_number: route_number.to_string(),
                    name: name.to_string(),
                    transport_type,
                    is_active: true,
                    frequency: Some(frequency.to_string()),
                })
                .await;
        }

        let stops = [
            ("Central Station", 56.8389, 60.6057),
            ("North Square", 56.8459, 60.6157),
            ("West Mall", 56.8329, 60.5957),
            ("East Station", 56.8329, 60.6157),
            ("South Terminal", 56.8259, 60.6057),
            ("City Center", 56.8389, 60.6107),
            ("University", 56.8429, 60.6037),
            ("Shopping Mall", 56.8349, 60.6207),
        ];
        for (name, latitude, longitude) in stops {
            catalog
                .create_stop(StopRequest {
                    name: name.to_string(),
                    latitude,
                    longitude,
                })
                .await;
        }

        catalog
    }

    /// Number of read queries served so far.
    pub fn query_count(&self) -> u64 {
        self.queries.load(Ordering::SeqCst)
    }

    fn record_query(&self, what: &str) {
        let n = self.queries.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(query = what, total = n, "Catalog query");
    }

    // == Routes ==
    pub async fn list_routes(&self, filter: &RouteFilter) -> Vec<Route> {
        self.record_query("list_routes");
        self.routes
            .read()
            .await
            .values()
            .filter(|route| filter.matches(route))
            .cloned()
            .collect()
    }

    pub async fn get_route(&self, id: u64) -> Option<Route> {
        self.record_query("get_route");
        self.routes.read().await.get(&id).cloned()
    }

    pub async fn create_route(&self, req: RouteRequest) -> Route {
        let id = self.next_route_id.fetch_add(1, Ordering::SeqCst) + 1;
        let route = Route {
            id,
            route_number: req.route_number,
            name: req.name,
            transport_type: req.transport_type,
            is_active: req.is_active,
            frequency: req.frequency,
            updated_at: Utc::now(),
        };

        self.routes.write().await.insert(id, route.clone());
        route
    }

    /// Replaces every field of route `id`. Returns `None` if it does not exist.
    pub async fn update_route(&self, id: u64, req: RouteRequest) -> Option<Route> {
        let mut routes = self.routes.write().await;
        let route = routes.get_mut(&id)?;

        route.route_number = req.route_number;
        route.name = req.name;
        route.transport_type = req.transport_type;
        route.is_active = req.is_active;
        route.frequency = req.frequency;
        route.updated_at = Utc::now();

        Some(route.clone())
    }

    pub async fn delete_route(&self, id: u64) -> bool {
        self.routes.write().await.remove(&id).is_some()
    }

    // == Stops ==
    pub async fn list_stops(&self) -> Vec<Stop> {
        self.record_query("list_stops");
        self.stops.read().await.values().cloned().collect()
    }

    pub async fn create_stop(&self, req: StopRequest) -> Stop {
        let id = self.next_stop_id.fetch_add(1, Ordering::SeqCst) + 1;
        let stop = Stop {
            id,
            name: req.name,
            latitude: req.latitude,
            longitude: req.longitude,
        };

        self.stops.write().await.insert(id, stop.clone());
        stop
    }

    pub async fn delete_stop(&self, id: u64) -> bool {
        self.stops.write().await.remove(&id).is_some()
    }
}
