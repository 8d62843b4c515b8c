//! Application initialization and resource setup.
//!
//! This module provides functions to initialize shared resources:
//! - Logger (plain or JSON)
//! - HTTP clients (alert delivery, per-session product clients)
//! - Concurrency semaphore bounding simultaneous product fetches
//!
//! All initialization functions return proper error types for error handling.

mod client;
mod logger;

use std::sync::Arc;

use tokio::sync::Semaphore;

// Re-export public API
pub use client::{build_session_client, init_alert_client};
pub use logger::init_logger_with;

/// Initializes a semaphore for controlling concurrency.
///
/// Each permit allows one product to be fetched, extracted and recorded at a
/// time. A count of zero is raised to one so the cycle can make progress.
///
/// # Arguments
///
/// * `count` - Maximum number of products processed concurrently
///
/// # Returns
///
/// An `Arc<Semaphore>` that can be shared across multiple tasks.
pub fn init_semaphore(count: usize) -> Arc<Semaphore> {
    Arc::new(Semaphore::new(count.max(1)))
}
