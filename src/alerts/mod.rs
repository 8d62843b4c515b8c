//! Price and stock alerts.
//!
//! This module decides which alerts a fresh [`ProductRecord`] fires for a
//! [`TrackedProduct`] and delivers them to the product's channels:
//! - Price drop: normalized price at or below the target price
//! - Back in stock: stock alert enabled and the stock text reports availability
//!
//! Channels are configured from environment variables: webhooks, bot APIs,
//! push, SMS and email. Each delivery is retried with exponential backoff when the failure is transient (timeouts,
//! 429, 5xx); a channel that keeps failing never stops the other channels.

mod channels;
mod message;

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

use tokio_retry::RetryIf;

use crate::error_handling::{get_retry_strategy, AlertError};
use crate::parse::ProductRecord;
use crate::registry::TrackedProduct;
use crate::utils::is_retriable_error;

pub use channels::{
    DiscordNotifier, EmailNotifier, LogNotifier, Notifier, PushoverNotifier, SlackNotifier,
    SmsNotifier, TelegramNotifier, PUSHOVER_ENDPOINT, TELEGRAM_API_BASE, TWILIO_API_BASE,
};
pub use message::{Alert, AlertKind};

/// Stock phrases that count as available (matched lower-case).
const AVAILABLE_PHRASES: &[&str] = &["in stock", "available"];

/// Stock phrases that contain an available phrase but mean the opposite.
const UNAVAILABLE_PHRASES: &[&str] = &["unavailable"];

/// Decides which alerts a record fires.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlertEvaluator;

impl AlertEvaluator {
    /// Evaluates `record` against the thresholds of `product`.
    ///
    /// # Returns
    ///
    /// Zero, one or two alert kinds, price drop first.
    pub fn evaluate(&self, product: &TrackedProduct, record: &ProductRecord) -> Vec<AlertKind> {
        let mut kinds = Vec::new();

        if let (Some(price), Some(target_price)) = (record.price, product.target_price) {
            if price <= target_price {
                kinds.push(AlertKind::PriceDrop {
                    price,
                    target_price,
                });
            }
        }

        if product.stock_alert && is_available(&record.stock) {
            kinds.push(AlertKind::BackInStock);
        }

        kinds
    }
}

/// True when the stock text reports the product as available.
pub fn is_available(stock: &str) -> bool {
    let stock = stock.to_lowercase();
    AVAILABLE_PHRASES.iter().any(|phrase| stock.contains(phrase))
        && !UNAVAILABLE_PHRASES.iter().any(|phrase| stock.contains(phrase))
}

/// Outcome of dispatching one alert.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Channels that accepted the alert
    pub sent: Vec<String>,
    /// Channels that failed, with the last error
    pub failed: Vec<(String, String)>,
    /// Requested channels with no configured backend
    pub skipped: Vec<String>,
}

/// Routes alerts to the configured notifiers.
pub struct AlertManager {
    notifiers: BTreeMap<&'static str, Box<dyn Notifier>>,
    warned: Mutex<HashSet<String>>,
}

impl Default for AlertManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertManager {
    /// A manager with only the log channel.
    pub fn new() -> Self {
        let mut manager = Self {
            notifiers: BTreeMap::new(),
            warned: Mutex::new(HashSet::new()),
        };
        manager.register(Box::new(LogNotifier));
        manager
    }

    /// Adds or replaces the notifier for its channel.
    pub fn register(&mut self, notifier: Box<dyn Notifier>) {
        self.notifiers.insert(notifier.channel(), notifier);
    }

    /// Names of the configured channels.
    pub fn channels(&self) -> Vec<&'static str> {
        self.notifiers.keys().copied().collect()
    }

    /// Configures channels from the process environment.
    pub fn from_env(client: Arc<reqwest::Client>) -> Self {
        Self::from_lookup(client, |name| std::env::var(name).ok())
    }

    /// Configures channels from `lookup`.
    ///
    /// A channel is enabled by `<CHANNEL>_ENABLED` set to `true`, `1` or
    /// `yes`. An enabled channel with a missing credential is logged and
    /// left out.
    ///
    /// # Arguments
    ///
    /// * `client` - Shared HTTP client used by every HTTP channel
    /// * `lookup` - Variable lookup, `std::env::var` in production
    pub fn from_lookup<F>(client: Arc<reqwest::Client>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut manager = Self::new();
        let enabled = |name: &str| {
            lookup(name)
                .map(|v| matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "yes"))
                .unwrap_or(false)
        };
        let require = |channel: &'static str, variable: &'static str| {
            let value = lookup(variable).filter(|v| !v.trim().is_empty());
            if value.is_none() {
                log::warn!("{}", AlertError::MissingCredential { channel, variable });
            }
            value
        };

        if enabled("DISCORD_ENABLED") {
            if let Some(url) = require("discord", "DISCORD_WEBHOOK_URL") {
                manager.register(Box::new(DiscordNotifier::new(Arc::clone(&client), url)));
            }
        }
        if enabled("SLACK_ENABLED") {
            if let Some(url) = require("slack", "SLACK_WEBHOOK_URL") {
                manager.register(Box::new(SlackNotifier::new(Arc::clone(&client), url)));
            }
        }
        if enabled("TELEGRAM_ENABLED") {
            let token = require("telegram", "TELEGRAM_BOT_TOKEN");
            let chat_id = require("telegram", "TELEGRAM_CHAT_ID");
            if let (Some(token), Some(chat_id)) = (token, chat_id) {
                manager.register(Box::new(TelegramNotifier::new(
                    Arc::clone(&client),
                    token,
                    chat_id,
                )));
            }
        }
        if enabled("PUSH_ENABLED") {
            let user_key = require("push", "PUSHOVER_USER_KEY");
            let api_token = require("push", "PUSHOVER_API_TOKEN");
            if let (Some(user_key), Some(api_token)) = (user_key, api_token) {
                manager.register(Box::new(PushoverNotifier::new(
                    Arc::clone(&client),
                    user_key,
                    api_token,
                )));
            }
        }
        if enabled("SMS_ENABLED") {
            let account_sid = require("sms", "TWILIO_ACCOUNT_SID");
            let auth_token = require("sms", "TWILIO_AUTH_TOKEN");
            let from = require("sms", "TWILIO_PHONE_NUMBER");
            let to = require("sms", "RECEIVER_PHONE_NUMBER");
            if let (Some(account_sid), Some(auth_token), Some(from), Some(to)) =
                (account_sid, auth_token, from, to)
            {
                manager.register(Box::new(SmsNotifier::new(
                    Arc::clone(&client),
                    account_sid,
                    auth_token,
                    from,
                    to,
                )));
            }
        }
        if enabled("EMAIL_ENABLED") {
            let username = require("email", "GMAIL_USERNAME");
            let app_password = require("email", "GMAIL_APP_PASSWORD");
            let receiver = require("email", "RECEIVER_EMAIL");
            if let (Some(username), Some(app_password), Some(receiver)) =
                (username, app_password, receiver)
            {
                match EmailNotifier::gmail(&username, app_password, &receiver) {
                    Ok(notifier) => manager.register(Box::new(notifier)),
                    Err(e) => log::warn!("Email alerts disabled: {e}"),
                }
            }
        }

        log::info!("Alert channels: {}", manager.channels().join(", "));
        manager
    }

    /// Sends `alert` to every channel in `channels`, then to the log channel.
    ///
    /// Channels without a backend are skipped with a single warning per
    /// channel name for the lifetime of the manager.
    ///
    /// # Returns
    ///
    /// A [`DeliveryReport`]. Delivery failures are reported, never returned
    /// as errors.
    pub async fn dispatch(&self, alert: &Alert, channels: &[String]) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        let mut requested: Vec<&str> = Vec::new();
        for channel in channels.iter().map(|c| c.trim()) {
            if !channel.is_empty() && !requested.contains(&channel) {
                requested.push(channel);
            }
        }
        if !requested.contains(&"log") {
            requested.push("log");
        }

        for channel in requested {
            let Some(notifier) = self.notifiers.get(channel) else {
                self.warn_once(channel);
                report.skipped.push(channel.to_string());
                continue;
            };

            let result = RetryIf::spawn(
                get_retry_strategy(),
                || notifier.send(alert),
                is_retriable_error,
            )
            .await;

            match result {
                Ok(()) => {
                    log::debug!("{} alert for {} sent via {}", alert.headline(), alert.record.asin, channel);
                    report.sent.push(channel.to_string());
                }
                Err(e) => {
                    log::error!("Failed to send {} alert for {}: {}", channel, alert.record.asin, e);
                    report.failed.push((channel.to_string(), e.to_string()));
                }
            }
        }
        report
    }

    fn warn_once(&self, channel: &str) {
        let first = match self.warned.lock() {
            Ok(mut warned) => warned.insert(channel.to_string()),
            Err(_) => true,
        };
        if first {
            log::warn!("Alert channel '{channel}' is not configured; alerts go to the other channels");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::ExtractionTrace;

    fn record(price: Option<f64>, stock: &str) -> ProductRecord {
        ProductRecord {
            asin: "B0ALERT".to_string(),
            title: Some("Headphones".to_string()),
            price_raw: price.map(|p| format!("${p:.2}")),
            price,
            stock: stock.to_string(),
            rating_raw: None,
            reviews_raw: None,
            url: "https://www.amazon.com/dp/B0ALERT".to_string(),
            trace: ExtractionTrace::default(),
        }
    }

    #[test]
    fn test_price_at_target_fires() {
        let product = TrackedProduct::new("B0ALERT", "Headphones").with_target_price(Some(50.0));
        let kinds = AlertEvaluator.evaluate(&product, &record(Some(50.0), "Unknown"));
        assert_eq!(
            kinds,
            vec![AlertKind::PriceDrop {
                price: 50.0,
                target_price: 50.0
            }]
        );
        assert!(AlertEvaluator
            .evaluate(&product, &record(Some(50.01), "Unknown"))
            .is_empty());
        assert!(AlertEvaluator.evaluate(&product, &record(None, "Unknown")).is_empty());
    }

    #[test]
    fn test_stock_alert_requires_opt_in() {
        let product = TrackedProduct::new("B0ALERT", "Headphones");
        assert!(AlertEvaluator
            .evaluate(&product, &record(None, "In Stock"))
            .is_empty());

        let product = product.with_stock_alert(true);
        assert_eq!(
            AlertEvaluator.evaluate(&product, &record(None, "Only 2 left in stock - order soon.")),
            vec![AlertKind::BackInStock]
        );
        assert!(AlertEvaluator
            .evaluate(&product, &record(None, "Currently unavailable."))
            .is_empty());
    }

    #[test]
    fn test_is_available() {
        assert!(is_available("In Stock"));
        assert!(is_available("Available from these sellers."));
        assert!(!is_available("Unknown"));
        assert!(!is_available("Temporarily out of stock."));
    }

    #[test]
    fn test_from_lookup_skips_missing_credentials() {
        let client = Arc::new(reqwest::Client::new());
        let manager = AlertManager::from_lookup(client, |name| match name {
            "DISCORD_ENABLED" => Some("true".to_string()),
            "SLACK_ENABLED" => Some("TRUE".to_string()),
            "SLACK_WEBHOOK_URL" => Some("http://127.0.0.1:1/hook".to_string()),
            "TELEGRAM_ENABLED" => Some("false".to_string()),
            _ => None,
        });
        assert_eq!(manager.channels(), vec!["log", "slack"]);
    }

    #[tokio::test]
    async fn test_from_lookup_configures_email_and_sms() {
        let client = Arc::new(reqwest::Client::new());
        let manager = AlertManager::from_lookup(client, |name| {
            let value = match name {
                "EMAIL_ENABLED" | "SMS_ENABLED" => "yes",
                "GMAIL_USERNAME" => "tracker@gmail.com",
                "GMAIL_APP_PASSWORD" => "app-password",
                "RECEIVER_EMAIL" => "me@example.com",
                "TWILIO_ACCOUNT_SID" => "AC123",
                "TWILIO_AUTH_TOKEN" => "auth-token",
                "TWILIO_PHONE_NUMBER" => "+15550001111",
                "RECEIVER_PHONE_NUMBER" => "+15552223333",
                _ => return None,
            };
            Some(value.to_string())
        });
        assert_eq!(manager.channels(), vec!["email", "log", "sms"]);
    }

    #[tokio::test]
    async fn test_from_lookup_skips_invalid_email_address() {
        let client = Arc::new(reqwest::Client::new());
        let manager = AlertManager::from_lookup(client, |name| {
            let value = match name {
                "EMAIL_ENABLED" => "true",
                "GMAIL_USERNAME" => "tracker@gmail.com",
                "GMAIL_APP_PASSWORD" => "app-password",
                "RECEIVER_EMAIL" => "not an address",
                "SMS_ENABLED" => "true",
                "TWILIO_ACCOUNT_SID" => "AC123",
                _ => return None,
            };
            Some(value.to_string())
        });
        assert_eq!(manager.channels(), vec!["log"]);
    }

    #[tokio::test]
    async fn test_dispatch_skips_unconfigured_channels() {
        let manager = AlertManager::new();
        let alert = Alert::new(AlertKind::BackInStock, record(None, "In Stock"));
        let report = manager
            .dispatch(&alert, &["email".to_string(), "sms".to_string(), "email".to_string()])
            .await;
        assert_eq!(report.sent, vec!["log".to_string()]);
        assert_eq!(report.skipped, vec!["email".to_string(), "sms".to_string()]);
        assert!(report.failed.is_empty());
    }
}
