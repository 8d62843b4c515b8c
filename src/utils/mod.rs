//! Small helpers shared across modules.
//!
//! This module provides:
//! - Alert delivery error retriability
//! - Text sanitization (whitespace collapsing, truncation)
//! - CSS selector parsing and element text helpers

mod retry;
pub mod sanitize;
mod selector;

pub(crate) use retry::is_retriable_error;
pub use sanitize::{collapse_whitespace, strip_control_chars, truncate_chars};
pub use selector::{element_text, parse_selector_with_fallback};
