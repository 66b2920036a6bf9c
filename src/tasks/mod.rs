//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Cache cleanup: purges expired entries and stale tag epochs at configured intervals

mod cleanup;

pub use cleanup::spawn_cleanup_task;
