//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (retry counts, delays, block signatures, paths)
//! - Library configuration structs (`Config`, `FetchConfig`)
//! - CLI option types and parsing (`Opt`)

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{Config, FetchConfig, LogFormat, LogLevel, Opt};
