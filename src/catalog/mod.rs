//! Catalog Module
//!
//! The transit catalog (routes and stops) and the cached service in front
//! of it.

mod repository;
mod service;

pub use repository::TransitCatalog;
pub use service::{
    CatalogService, CatalogTtls, ROUTES_DETAIL_PREFIX, ROUTES_LIST_PREFIX, ROUTES_PREFIX,
    STOPS_LIST_PREFIX, STOPS_PREFIX,
};
