//! API Module
//!
//! HTTP handlers and routing for the transit REST API.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /cache/stats` - Cache statistics
//! - `GET /routes`, `GET /routes/:id` - Cached route reads
//! - `POST /routes`, `PUT /routes/:id`, `DELETE /routes/:id` - Route writes
//! - `GET /stops` - Cached stop list
//! - `POST /stops`, `DELETE /stops/:id` - Stop writes

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
