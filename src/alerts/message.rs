//! Alert text shared by every channel.

use crate::config::{EMAIL_SUBJECT_TITLE_CHARS, MAX_ALERT_TITLE_CHARS, SMS_TITLE_CHARS};
use crate::parse::ProductRecord;
use crate::utils::{strip_control_chars, truncate_chars};

const NOT_AVAILABLE: &str = "N/A";

/// Condition that fired an alert.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlertKind {
    /// Price at or below the product's target.
    PriceDrop {
        /// Price found on the page
        price: f64,
        /// Price the product was waiting for
        target_price: f64,
    },
    /// Stock text reports availability.
    BackInStock,
}

/// One alert: the firing condition and the record that fired it.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    /// Condition that fired
    pub kind: AlertKind,
    /// Record that fired it
    pub record: ProductRecord,
}

impl Alert {
    /// Creates an alert for `record`.
    pub fn new(kind: AlertKind, record: ProductRecord) -> Self {
        Self { kind, record }
    }

    /// Notification title for the alert kind.
    pub fn headline(&self) -> &'static str {
        match self.kind {
            AlertKind::PriceDrop { .. } => "Price Drop Alert!",
            AlertKind::BackInStock => "Stock Alert",
        }
    }

    /// Product title shortened for notification bodies.
    pub fn short_title(&self) -> String {
        self.title_within(MAX_ALERT_TITLE_CHARS)
    }

    fn title_within(&self, max_chars: usize) -> String {
        match &self.record.title {
            Some(title) => truncate_chars(&strip_control_chars(title), max_chars),
            None => self.record.asin.clone(),
        }
    }

    /// Email subject line.
    pub fn subject(&self) -> String {
        let prefix = match self.kind {
            AlertKind::PriceDrop { .. } => "Price Drop Alert",
            AlertKind::BackInStock => "Stock Alert",
        };
        format!("{}: {}", prefix, self.title_within(EMAIL_SUBJECT_TITLE_CHARS))
    }

    /// One-line text message body.
    pub fn sms_text(&self) -> String {
        let title = self.title_within(SMS_TITLE_CHARS);
        match self.kind {
            AlertKind::PriceDrop {
                price,
                target_price,
            } => format!(
                "Price Drop: {} is now ${:.2} (target: ${:.2})",
                title, price, target_price
            ),
            AlertKind::BackInStock => format!("Stock Alert: {} is now {}!", title, self.record.stock),
        }
    }

    /// Raw price text, or `N/A`.
    pub fn price_raw(&self) -> &str {
        self.record.price_raw.as_deref().unwrap_or(NOT_AVAILABLE)
    }

    /// Raw rating text, or `N/A`.
    pub fn rating(&self) -> &str {
        self.record.rating_raw.as_deref().unwrap_or(NOT_AVAILABLE)
    }

    /// Multi-line body used by chat channels.
    pub fn text(&self) -> String {
        let record = &self.record;
        match self.kind {
            AlertKind::PriceDrop {
                price,
                target_price,
            } => format!(
                "{}\n\nProduct: {}\nASIN: {}\nCurrent: ${:.2}\nTarget: ${:.2}\nYou Save: ${:.2}\nStock: {}\nRating: {}\n\nView on Amazon: {}",
                self.headline(),
                self.short_title(),
                record.asin,
                price,
                target_price,
                target_price - price,
                record.stock,
                self.rating(),
                record.url
            ),
            AlertKind::BackInStock => format!(
                "{}\n\nProduct: {}\nASIN: {}\nStock: {}\nPrice: {}\n\nView on Amazon: {}",
                self.headline(),
                self.short_title(),
                record.asin,
                record.stock,
                self.price_raw(),
                record.url
            ),
        }
    }

    /// Two-line summary used by push notifications and logs.
    pub fn summary(&self) -> String {
        match self.kind {
            AlertKind::PriceDrop {
                price,
                target_price,
            } => format!(
                "{}\nNow: ${:.2} (Target: ${:.2})",
                self.short_title(),
                price,
                target_price
            ),
            AlertKind::BackInStock => {
                format!("{}\nStock: {}", self.short_title(), self.record.stock)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::ExtractionTrace;

    fn record() -> ProductRecord {
        ProductRecord {
            asin: "B08N5WRWNW".to_string(),
            title: Some("Echo Dot (4th Gen)".to_string()),
            price_raw: Some("$24.99".to_string()),
            price: Some(24.99),
            stock: "In Stock".to_string(),
            rating_raw: None,
            reviews_raw: None,
            url: "https://www.amazon.com/dp/B08N5WRWNW".to_string(),
            trace: ExtractionTrace::default(),
        }
    }

    #[test]
    fn test_price_drop_text() {
        let alert = Alert::new(
            AlertKind::PriceDrop {
                price: 24.99,
                target_price: 29.99,
            },
            record(),
        );
        let text = alert.text();
        assert!(text.starts_with("Price Drop Alert!"));
        assert!(text.contains("Current: $24.99"));
        assert!(text.contains("You Save: $5.00"));
        assert!(text.contains("Rating: N/A"));
        assert_eq!(alert.summary(), "Echo Dot (4th Gen)\nNow: $24.99 (Target: $29.99)");
    }

    #[test]
    fn test_stock_text() {
        let alert = Alert::new(AlertKind::BackInStock, record());
        assert!(alert.text().contains("Stock: In Stock\nPrice: $24.99"));
    }

    #[test]
    fn test_missing_title_uses_asin() {
        let mut record = record();
        record.title = None;
        let alert = Alert::new(AlertKind::BackInStock, record);
        assert_eq!(alert.short_title(), "B08N5WRWNW");
    }

    #[test]
    fn test_long_title_truncated() {
        let mut record = record();
        record.title = Some("x".repeat(300));
        let alert = Alert::new(AlertKind::BackInStock, record);
        assert_eq!(alert.short_title().chars().count(), MAX_ALERT_TITLE_CHARS + 3);
        assert_eq!(
            alert.subject(),
            format!("Stock Alert: {}...", "x".repeat(EMAIL_SUBJECT_TITLE_CHARS))
        );
        assert_eq!(
            alert.sms_text(),
            format!("Stock Alert: {}... is now In Stock!", "x".repeat(SMS_TITLE_CHARS))
        );
    }

    #[test]
    fn test_sms_and_subject_for_price_drop() {
        let alert = Alert::new(
            AlertKind::PriceDrop {
                price: 24.99,
                target_price: 29.99,
            },
            record(),
        );
        assert_eq!(alert.subject(), "Price Drop Alert: Echo Dot (4th Gen)");
        assert_eq!(
            alert.sms_text(),
            "Price Drop: Echo Dot (4th Gen) is now $24.99 (target: $29.99)"
        );
    }
}
