//! Price normalization.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::CURRENCY_SYMBOLS;

/// First decimal-number-shaped substring: integer part, optional fraction.
const NUMBER_PATTERN_STR: &str = r"\d+\.?\d*";

static NUMBER_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    match Regex::new(NUMBER_PATTERN_STR) {
        Ok(re) => Some(re),
        Err(e) => {
            log::error!("Failed to compile price pattern '{}': {}", NUMBER_PATTERN_STR, e);
            None
        }
    }
});

/// Parses a loosely formatted price into a number.
///
/// Currency symbols (`$`, `£`, `€`), whitespace and thousands separators are
/// stripped, then the first number-shaped substring is parsed. A range such as
/// `"$19.99 - $29.99"` therefore resolves to its lower bound.
///
/// # Arguments
///
/// * `raw` - Price text as scraped, if any
///
/// # Returns
///
/// The numeric price, or `None` if the input is absent, empty or contains no
/// number.
///
/// # Examples
///
/// ```
/// use price_tracker::parse::normalize_price;
///
/// assert_eq!(normalize_price(Some("$1,234.56")), Some(1234.56));
/// assert_eq!(normalize_price(Some("$19.99 - $29.99")), Some(19.99));
/// assert_eq!(normalize_price(Some("Invalid")), None);
/// assert_eq!(normalize_price(None), None);
/// ```
pub fn normalize_price(raw: Option<&str>) -> Option<f64> {
    let cleaned: String = raw?
        .chars()
        .filter(|c| !CURRENCY_SYMBOLS.contains(c) && *c != ',')
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }

    let pattern = NUMBER_PATTERN.as_ref()?;
    let number = pattern.find(cleaned)?;
    number.as_str().parse::<f64>().ok()
}

/// First known currency symbol appearing in `text`.
pub fn currency_symbol(text: &str) -> Option<char> {
    text.chars().find(|c| CURRENCY_SYMBOLS.contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_price_table() {
        let cases: &[(Option<&str>, Option<f64>)] = &[
            (Some("$1,234.56"), Some(1234.56)),
            (Some("24.99"), Some(24.99)),
            (Some("£15.50"), Some(15.5)),
            (Some("€9"), Some(9.0)),
            (Some("$19.99 - $29.99"), Some(19.99)),
            (Some("  $ 42.00 "), Some(42.0)),
            (Some("$1,299"), Some(1299.0)),
            (Some(""), None),
            (Some("   "), None),
            (Some("Invalid"), None),
            (Some("$"), None),
            (None, None),
        ];
        for (raw, expected) in cases {
            assert_eq!(normalize_price(*raw), *expected, "input {:?}", raw);
        }
    }

    #[test]
    fn test_space_separated_prices_stay_apart() {
        assert_eq!(normalize_price(Some("$24.99 $29.99")), Some(24.99));
        assert_eq!(normalize_price(Some("24.99 29.99")), Some(24.99));
    }

    #[test]
    fn test_trailing_dot() {
        assert_eq!(normalize_price(Some("$24.")), Some(24.0));
    }

    #[test]
    fn test_text_around_number() {
        assert_eq!(normalize_price(Some("Now $39.99 only")), Some(39.99));
    }

    #[test]
    fn test_currency_symbol() {
        assert_eq!(currency_symbol("£15.50"), Some('£'));
        assert_eq!(currency_symbol("15.50 EUR"), None);
    }
}
