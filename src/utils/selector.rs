//! CSS selector helpers shared by the extraction strategies.

use scraper::{ElementRef, Selector};

use crate::utils::sanitize::collapse_whitespace;

/// Selector that never matches, used when a selector string is invalid.
const NEVER_MATCH: &str = "*:not(*)";

/// Parses a CSS selector, falling back to one that matches nothing.
///
/// Strategy selectors are literals, so a parse failure is a programming error;
/// it is logged and the strategy simply never matches instead of panicking in
/// the middle of a tracking cycle.
///
/// # Arguments
///
/// * `selector_str` - The CSS selector string to parse
/// * `context` - What the selector is for, used in the error message
pub fn parse_selector_with_fallback(selector_str: &str, context: &str) -> Selector {
    Selector::parse(selector_str).unwrap_or_else(|e| {
        log::error!(
            "Invalid CSS selector '{}' for {}: {}. Strategy disabled.",
            selector_str,
            context,
            e
        );
        never_matching_selector()
    })
}

fn never_matching_selector() -> Selector {
    match Selector::parse(NEVER_MATCH) {
        Ok(selector) => selector,
        // `*:not(*)` is valid CSS; reaching this arm means scraper changed its grammar
        Err(e) => unreachable!("fallback selector rejected: {e}"),
    }
}

/// Text content of an element with whitespace runs collapsed to one space.
pub fn element_text(element: &ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}
