//! Catalog entities and HTTP request/response models
//!
//! Entities are what the catalog stores and what the cache holds as JSON;
//! request and response types only travel over HTTP.

pub mod requests;
pub mod responses;
pub mod transit;

// Re-export commonly used types
pub use requests::{RouteFilter, RouteRequest, StopRequest};
pub use responses::{DeleteResponse, ErrorResponse, HealthResponse};
pub use transit::{Route, Stop, TransportType};
