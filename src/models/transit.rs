//! Transit Entities
//!
//! Routes and stops as stored by the catalog and cached by the service layer.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of vehicle serving a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportType {
    Bus,
    Tram,
}

impl fmt::Display for TransportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportType::Bus => f.write_str("bus"),
            TransportType::Tram => f.write_str("tram"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: u64,
    pub route_number: String,
    pub name: String,
    pub transport_type: TransportType,
    pub is_active: bool,
    /// Free-form headway, e.g. "Every 8 min"
    pub frequency: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub id: u64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_type_wire_format() {
        assert_eq!(serde_json::to_string(&TransportType::Tram).unwrap(), "\"tram\"");
        assert_eq!(
            serde_json::from_str::<TransportType>("\"bus\"").unwrap(),
            TransportType::Bus
        );
        assert_eq!(TransportType::Bus.to_string(), "bus");
    }

    #[test]
    fn test_route_json_roundtrip() {
        let route = Route {
            id: 1,
            route_number: "T5".to_string(),
            name: "West Mall - Central Station - East Station".to_string(),
            transport_type: TransportType::Tram,
            is_active: true,
            frequency: Some("Every 8 min".to_string()),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_string(&route).unwrap();
        let back: Route = serde_json::from_str(&json).unwrap();
        assert_eq!(back, route);
    }
}
