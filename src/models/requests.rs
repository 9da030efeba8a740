//! Request DTOs for the transit API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;

use crate::cache::{IntoKeyArgs, KeyArgs};
use crate::models::TransportType;

fn default_transport_type() -> TransportType {
    TransportType::Bus
}

fn default_active() -> bool {
    true
}

/// Request body for creating or replacing a route (POST /routes, PUT /routes/:id)
#[derive(Debug, Clone, Deserialize)]
pub struct RouteRequest {
    pub route_number: String,
    pub name: String,
    #[serde(default = "default_transport_type")]
    pub transport_type: TransportType,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub frequency: Option<String>,
}

impl RouteRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.route_number.trim().is_empty() {
            return Some("Route number cannot be empty".to_string());
        }
        if self.name.trim().is_empty() {
            return Some("Route name cannot be empty".to_string());
        }
        None
    }
}

/// Request body for creating a stop (POST /stops)
#[derive(Debug, Clone, Deserialize)]
pub struct StopRequest {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl StopRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.name.trim().is_empty() {
            return Some("Stop name cannot be empty".to_string());
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Some(format!("Latitude {} is outside [-90, 90]", self.latitude));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Some(format!("Longitude {} is outside [-180, 180]", self.longitude));
        }
        None
    }
}

/// Query string for GET /routes. Absent fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RouteFilter {
    pub transport_type: Option<TransportType>,
    pub is_active: Option<bool>,
}

impl RouteFilter {
    pub fn matches(&self, route: &crate::models::Route) -> bool {
        self.transport_type.map_or(true, |t| route.transport_type == t)
            && self.is_active.map_or(true, |active| route.is_active == active)
    }
}

impl IntoKeyArgs for RouteFilter {
    fn key_args(&self) -> KeyArgs {
        KeyArgs::new()
            .named_opt("transport_type", self.transport_type)
            .named_opt("is_active", self.is_active)
    }
}
