//! Product page extraction.
//!
//! This module turns raw product-page markup into a [`ProductRecord`]:
//! - Title, price, stock, rating and review count located by ordered
//!   strategy lists (see [`FieldPlan`])
//! - Price normalized into a number (see [`normalize_price`])
//! - Stock defaulting to `"Unknown"` when no availability markup exists
//!
//! Missing fields never fail a record. Only markup that is empty, or a
//! title-less page carrying a challenge signature, yields no record.
//!
//! All parsing is done using CSS selectors via the `scraper` crate.

mod plan;
mod price;
mod strategy;

use std::sync::Arc;

use scraper::Html;
use serde::Serialize;

use crate::config::{FetchConfig, UNKNOWN_STOCK, URL_TEMPLATE_PLACEHOLDER};
use crate::error_handling::{ExtractionFailure, FailureKind, ProcessingStats};
use crate::fetch::find_block_signature;

pub use plan::{price_plan, rating_plan, reviews_plan, stock_plan, title_plan};
pub use price::{currency_symbol, normalize_price};
pub use strategy::{Field, FieldMatch, FieldPlan, FieldStrategy, MatchRule};

/// Which strategy produced each field, for diagnostics.
///
/// `None` means no strategy matched. `block_signature_checked` records that
/// the title was missing and the markup was therefore scanned for a challenge
/// signature (and none was found, otherwise there would be no record).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionTrace {
    /// Title strategy
    pub title: Option<&'static str>,
    /// Price strategy
    pub price: Option<&'static str>,
    /// Stock strategy
    pub stock: Option<&'static str>,
    /// Rating strategy
    pub rating: Option<&'static str>,
    /// Review count strategy
    pub reviews: Option<&'static str>,
    /// Whether a missing title triggered the challenge-page check
    pub block_signature_checked: bool,
}

/// Structured result of one fetch+parse cycle.
///
/// Never mutated after construction. `stock` is always non-empty. `price` may
/// be absent while `price_raw` is present when the price text did not parse;
/// the raw text is kept for audit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRecord {
    /// Site item identifier
    pub asin: String,
    /// Product title
    pub title: Option<String>,
    /// Price text as found on the page
    pub price_raw: Option<String>,
    /// Normalized numeric price
    pub price: Option<f64>,
    /// Availability text, `"Unknown"` when not found
    pub stock: String,
    /// Rating text, e.g. `"4.5 out of 5 stars"`
    pub rating_raw: Option<String>,
    /// Review count text, e.g. `"1,234 ratings"`
    pub reviews_raw: Option<String>,
    /// Canonical product URL
    pub url: String,
    /// Strategy that produced each field
    #[serde(skip)]
    pub trace: ExtractionTrace,
}

/// Extracts product records from raw markup.
///
/// Holds its strategy lists and block signatures; cheap to share behind an
/// `Arc` and safe to use from several tasks.
#[derive(Debug, Clone)]
pub struct Extractor {
    title: FieldPlan,
    price: FieldPlan,
    stock: FieldPlan,
    rating: FieldPlan,
    reviews: FieldPlan,
    block_signatures: Vec<String>,
    url_template: String,
    stats: Option<Arc<ProcessingStats>>,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(&FetchConfig::default())
    }
}

impl Extractor {
    /// Builds an extractor using the block signatures and URL template of
    /// `config`.
    pub fn new(config: &FetchConfig) -> Self {
        Self {
            title: title_plan(),
            price: price_plan(),
            stock: stock_plan(),
            rating: rating_plan(),
            reviews: reviews_plan(),
            block_signatures: config.block_signatures.clone(),
            url_template: config.url_template.clone(),
            stats: None,
        }
    }

    /// Records missing-field warnings and normalization misses in `stats`.
    pub fn with_stats(mut self, stats: Arc<ProcessingStats>) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Extracts a record, absorbing whole-document failures.
    ///
    /// # Returns
    ///
    /// `None` when the document is empty or is a title-less challenge page;
    /// otherwise a record, possibly with several absent optional fields.
    pub fn extract(&self, raw: &str, target_id: &str) -> Option<ProductRecord> {
        match self.try_extract(raw, target_id) {
            Ok(record) => Some(record),
            Err(e) => {
                log::warn!("No record for {target_id}: {e}");
                None
            }
        }
    }

    /// Extracts a record, reporting why none could be built.
    ///
    /// # Errors
    ///
    /// * `ExtractionFailure::EmptyDocument` - empty or whitespace-only markup
    /// * `ExtractionFailure::Blocked` - no title and a block signature present
    pub fn try_extract(
        &self,
        raw: &str,
        target_id: &str,
    ) -> Result<ProductRecord, ExtractionFailure> {
        if raw.trim().is_empty() {
            return Err(ExtractionFailure::EmptyDocument);
        }

        let document = Html::parse_document(raw);
        let mut trace = ExtractionTrace::default();

        let title = self.locate(&self.title, &document, &mut trace.title);
        if title.is_none() {
            trace.block_signature_checked = true;
            if let Some(signature) = find_block_signature(raw, &self.block_signatures) {
                return Err(ExtractionFailure::Blocked {
                    signature: signature.to_string(),
                });
            }
        }

        let price_raw = self.locate(&self.price, &document, &mut trace.price);
        let price = normalize_price(price_raw.as_deref());
        if price_raw.is_some() && price.is_none() {
            log::warn!(
                "Price text {:?} for {} did not normalize",
                price_raw.as_deref().unwrap_or_default(),
                target_id
            );
            if let Some(stats) = &self.stats {
                stats.increment_failure(FailureKind::NormalizationMiss);
            }
        }

        let stock = self
            .locate(&self.stock, &document, &mut trace.stock)
            .unwrap_or_else(|| UNKNOWN_STOCK.to_string());
        let rating_raw = self.locate(&self.rating, &document, &mut trace.rating);
        let reviews_raw = self.locate(&self.reviews, &document, &mut trace.reviews);

        let record = ProductRecord {
            asin: target_id.trim().to_string(),
            title,
            price_raw,
            price,
            stock,
            rating_raw,
            reviews_raw,
            url: self
                .url_template
                .replace(URL_TEMPLATE_PLACEHOLDER, target_id.trim()),
            trace,
        };
        log::debug!(
            "Extracted {}: title={} price={:?} stock={:?}",
            record.asin,
            record.title.is_some(),
            record.price,
            record.stock
        );
        Ok(record)
    }

    fn locate(
        &self,
        plan: &FieldPlan,
        document: &Html,
        strategy: &mut Option<&'static str>,
    ) -> Option<String> {
        match plan.evaluate(document) {
            Some(found) => {
                *strategy = Some(found.strategy);
                Some(found.value)
            }
            None => {
                log::debug!("No strategy found {}", plan.field().as_str());
                if let Some(stats) = &self.stats {
                    stats.increment_warning(plan.field().missing_warning());
                }
                None
            }
        }
    }
}
