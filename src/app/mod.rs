//! Application helpers used by the binary and the cycle runner.
//!
//! This module provides registry commands, Ctrl-C handling, and statistics
//! printing.

pub mod commands;
pub mod shutdown;
pub mod statistics;

// Re-export public API
pub use commands::{export_products, import_products, list_products};
pub use shutdown::{shutdown_gracefully, spawn_ctrl_c_handler};
pub use statistics::{print_cycle_statistics, print_processing_statistics};
