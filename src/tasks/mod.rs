//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Local cache sweeper: drops expired local-tier entries at a fixed interval

mod cleanup;

pub use cleanup::spawn_cleanup_task;
