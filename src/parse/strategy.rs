//! Ordered extraction strategies.
//!
//! Each field has a [`FieldPlan`]: a list of tagged [`FieldStrategy`] values,
//! most structurally specific first. Strategies are evaluated lazily and the
//! first one producing a non-empty value wins, so a generic fallback only runs
//! when every specific query came up empty.

use scraper::{Html, Selector};
use serde::Serialize;

use crate::error_handling::WarningType;
use crate::parse::price::{currency_symbol, normalize_price};
use crate::utils::{element_text, parse_selector_with_fallback};

/// Record fields located by the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// Product title
    Title,
    /// Price text
    Price,
    /// Availability text
    Stock,
    /// Star rating text
    Rating,
    /// Review count text
    Reviews,
}

impl Field {
    /// Field name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Price => "price",
            Field::Stock => "stock",
            Field::Rating => "rating",
            Field::Reviews => "reviews",
        }
    }

    /// Warning recorded when no strategy finds the field.
    pub fn missing_warning(&self) -> WarningType {
        match self {
            Field::Title => WarningType::MissingTitle,
            Field::Price => WarningType::MissingPrice,
            Field::Stock => WarningType::MissingStock,
            Field::Rating => WarningType::MissingRating,
            Field::Reviews => WarningType::MissingReviews,
        }
    }
}

/// How matched elements are turned into a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchRule {
    /// Text of the first matching element, if non-empty.
    FirstElement,
    /// Text of the first matching element whose text is non-empty.
    FirstNonEmpty,
    /// First matching element whose text contains a digit.
    ContainsDigit,
    /// First matching element whose text contains a currency symbol and a digit.
    ContainsCurrency,
    /// Lowest parseable price among all matching elements, rendered as
    /// `<symbol><amount with 2 decimals>`.
    MinimumPrice,
}

/// One tagged query: a name for diagnostics, a selector and a match rule.
#[derive(Debug, Clone)]
pub struct FieldStrategy {
    name: &'static str,
    selector: Selector,
    rule: MatchRule,
}

impl FieldStrategy {
    /// Builds a strategy; the CSS is parsed once here.
    pub fn new(name: &'static str, css: &str, rule: MatchRule) -> Self {
        Self {
            name,
            selector: parse_selector_with_fallback(css, name),
            rule,
        }
    }

    /// Strategy name recorded in traces.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// How matches are reduced to a value.
    pub fn rule(&self) -> MatchRule {
        self.rule
    }

    /// Runs this strategy alone against a document.
    pub fn apply(&self, document: &Html) -> Option<String> {
        let mut texts = document
            .select(&self.selector)
            .map(|element| element_text(&element));

        match self.rule {
            MatchRule::FirstElement => texts.next().filter(|text| !text.is_empty()),
            MatchRule::FirstNonEmpty => texts.find(|text| !text.is_empty()),
            MatchRule::ContainsDigit => texts.find(|text| text.chars().any(|c| c.is_ascii_digit())),
            MatchRule::ContainsCurrency => texts.find(|text| {
                currency_symbol(text).is_some() && text.chars().any(|c| c.is_ascii_digit())
            }),
            MatchRule::MinimumPrice => minimum_price(texts),
        }
    }
}

fn minimum_price(texts: impl Iterator<Item = String>) -> Option<String> {
    let (value, symbol) = texts
        .filter_map(|text| {
            let value = normalize_price(Some(&text))?;
            Some((value, currency_symbol(&text)))
        })
        .min_by(|a, b| a.0.total_cmp(&b.0))?;

    Some(match symbol {
        Some(symbol) => format!("{symbol}{value:.2}"),
        None => format!("{value:.2}"),
    })
}

/// Value found for a field together with the strategy that found it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMatch {
    /// Extracted text
    pub value: String,
    /// Name of the strategy that found it
    pub strategy: &'static str,
}

/// Ordered strategy list for one field.
#[derive(Debug, Clone)]
pub struct FieldPlan {
    field: Field,
    strategies: Vec<FieldStrategy>,
}

impl FieldPlan {
    /// Creates a plan evaluated in the given order.
    pub fn new(field: Field, strategies: Vec<FieldStrategy>) -> Self {
        Self { field, strategies }
    }

    /// Field this plan extracts.
    pub fn field(&self) -> Field {
        self.field
    }

    /// Strategies in evaluation order.
    pub fn strategies(&self) -> &[FieldStrategy] {
        &self.strategies
    }

    /// Evaluates strategies in order and returns the first success.
    pub fn evaluate(&self, document: &Html) -> Option<FieldMatch> {
        self.strategies.iter().find_map(|strategy| {
            let value = strategy.apply(document)?;
            log::trace!(
                "{} found by strategy '{}': {}",
                self.field.as_str(),
                strategy.name,
                value
            );
            Some(FieldMatch {
                value,
                strategy: strategy.name,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(body: &str) -> Html {
        Html::parse_document(&format!("<html><body>{body}</body></html>"))
    }

    #[test]
    fn test_first_element_ignores_later_matches() {
        let strategy = FieldStrategy::new("spans", "span", MatchRule::FirstElement);
        assert_eq!(strategy.apply(&doc("<span> </span><span>second</span>")), None);
    }

    #[test]
    fn test_first_non_empty_skips_blank() {
        let strategy = FieldStrategy::new("spans", "span", MatchRule::FirstNonEmpty);
        assert_eq!(
            strategy.apply(&doc("<span> </span><span>second</span>")),
            Some("second".to_string())
        );
    }

    #[test]
    fn test_contains_digit() {
        let strategy = FieldStrategy::new("prices", "span", MatchRule::ContainsDigit);
        assert_eq!(
            strategy.apply(&doc("<span>See price in cart</span><span>$12.00</span>")),
            Some("$12.00".to_string())
        );
    }

    #[test]
    fn test_contains_currency() {
        let strategy = FieldStrategy::new("offscreen", "span", MatchRule::ContainsCurrency);
        assert_eq!(
            strategy.apply(&doc("<span>4.5 out of 5</span><span>£8.10</span>")),
            Some("£8.10".to_string())
        );
    }

    #[test]
    fn test_minimum_price_rerenders_symbol() {
        let strategy = FieldStrategy::new("buy box", "span", MatchRule::MinimumPrice);
        assert_eq!(
            strategy.apply(&doc("<span>$45.00</span><span>$39.9</span><span>n/a</span>")),
            Some("$39.90".to_string())
        );
    }

    #[test]
    fn test_minimum_price_without_candidates() {
        let strategy = FieldStrategy::new("buy box", "span", MatchRule::MinimumPrice);
        assert_eq!(strategy.apply(&doc("<span>n/a</span>")), None);
    }

    #[test]
    fn test_plan_first_success_wins() {
        let plan = FieldPlan::new(
            Field::Title,
            vec![
                FieldStrategy::new("specific", "#missing", MatchRule::FirstNonEmpty),
                FieldStrategy::new("heading", "h1", MatchRule::FirstNonEmpty),
                FieldStrategy::new("generic", "p", MatchRule::FirstNonEmpty),
            ],
        );
        let found = plan
            .evaluate(&doc("<h1>Heading</h1><p>Paragraph</p>"))
            .expect("heading strategy matches");
        assert_eq!(found.value, "Heading");
        assert_eq!(found.strategy, "heading");
    }

    #[test]
    fn test_plan_nothing_found() {
        let plan = FieldPlan::new(
            Field::Rating,
            vec![FieldStrategy::new("rating", ".a-icon-alt", MatchRule::FirstNonEmpty)],
        );
        assert_eq!(plan.evaluate(&doc("<p>x</p>")), None);
        assert_eq!(plan.field().missing_warning(), WarningType::MissingRating);
    }
}
