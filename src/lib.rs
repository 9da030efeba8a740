//! Transit Cache - transit catalog backend with a two-tier cache-aside layer
//!
//! Reads are served from Redis when it is reachable and from a process-local
//! LRU/TTL cache when it is not; writes invalidate the cached families they
//! touch.

pub mod api;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use tasks::spawn_cleanup_task;
