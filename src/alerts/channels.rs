//! Notification channels.
//!
//! Each channel is a [`Notifier`]: one POST to a webhook or bot API, or one
//! message through an SMTP relay. Non-2xx answers become
//! `AlertError::Rejected` so the retry policy can tell rate limiting from a
//! revoked token.

use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde_json::json;

use super::message::{Alert, AlertKind};
use crate::config::{ALERT_REQUEST_TIMEOUT, GMAIL_SMTP_RELAY};
use crate::error_handling::AlertError;

/// Default Telegram Bot API base URL.
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";
/// Default Pushover messages endpoint.
pub const PUSHOVER_ENDPOINT: &str = "https://api.pushover.net/1/messages.json";
/// Default Twilio REST API base URL.
pub const TWILIO_API_BASE: &str = "https://api.twilio.com";

const DISCORD_PRICE_COLOR: u32 = 65280;
const DISCORD_STOCK_COLOR: u32 = 3447003;

/// Delivers alerts to one channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Channel name as used in a product's `alert_channels`.
    fn channel(&self) -> &'static str;

    /// Delivers one alert. Called again by the retry policy on transient errors.
    async fn send(&self, alert: &Alert) -> Result<(), AlertError>;
}

async fn check_status(
    channel: &'static str,
    response: reqwest::Response,
) -> Result<(), AlertError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(AlertError::Rejected {
            channel,
            status: status.as_u16(),
        })
    }
}

/// Discord webhook with one embed per alert.
pub struct DiscordNotifier {
    client: Arc<reqwest::Client>,
    webhook_url: String,
}

impl DiscordNotifier {
    /// Posts to `webhook_url`.
    pub fn new(client: Arc<reqwest::Client>, webhook_url: impl Into<String>) -> Self {
        Self {
            client,
            webhook_url: webhook_url.into(),
        }
    }

    fn payload(alert: &Alert) -> serde_json::Value {
        let record = &alert.record;
        let (color, fields) = match alert.kind {
            AlertKind::PriceDrop {
                price,
                target_price,
            } => (
                DISCORD_PRICE_COLOR,
                json!([
                    {"name": "ASIN", "value": record.asin, "inline": true},
                    {"name": "Current Price", "value": format!("${price:.2}"), "inline": true},
                    {"name": "Target Price", "value": format!("${target_price:.2}"), "inline": true},
                    {"name": "You Save", "value": format!("${:.2}", target_price - price), "inline": true},
                    {"name": "Stock", "value": record.stock, "inline": true},
                    {"name": "Rating", "value": alert.rating(), "inline": true},
                ]),
            ),
            AlertKind::BackInStock => (
                DISCORD_STOCK_COLOR,
                json!([
                    {"name": "ASIN", "value": record.asin, "inline": true},
                    {"name": "Stock Status", "value": record.stock, "inline": true},
                    {"name": "Price", "value": alert.price_raw(), "inline": true},
                ]),
            ),
        };
        json!({
            "embeds": [{
                "title": alert.headline(),
                "description": alert.short_title(),
                "color": color,
                "fields": fields,
                "url": record.url,
            }]
        })
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    fn channel(&self) -> &'static str {
        "discord"
    }

    async fn send(&self, alert: &Alert) -> Result<(), AlertError> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&Self::payload(alert))
            .send()
            .await?;
        check_status(self.channel(), response).await
    }
}

/// Slack incoming webhook with one attachment per alert.
pub struct SlackNotifier {
    client: Arc<reqwest::Client>,
    webhook_url: String,
}

impl SlackNotifier {
    /// Posts to `webhook_url`.
    pub fn new(client: Arc<reqwest::Client>, webhook_url: impl Into<String>) -> Self {
        Self {
            client,
            webhook_url: webhook_url.into(),
        }
    }

    fn payload(alert: &Alert) -> serde_json::Value {
        let (color, text) = match alert.kind {
            AlertKind::PriceDrop {
                price,
                target_price,
            } => (
                "#00FF00",
                format!(
                    "*{}*\n{}\nCurrent: ${:.2} | Target: ${:.2}",
                    alert.headline(),
                    alert.short_title(),
                    price,
                    target_price
                ),
            ),
            AlertKind::BackInStock => (
                "#0000FF",
                format!(
                    "*{}*\n{}\nStock: *{}*",
                    alert.headline(),
                    alert.short_title(),
                    alert.record.stock
                ),
            ),
        };
        json!({
            "attachments": [{
                "color": color,
                "text": text,
                "fields": [
                    {"title": "ASIN", "value": alert.record.asin, "short": true},
                    {"title": "Price", "value": alert.price_raw(), "short": true},
                ],
                "actions": [{
                    "type": "button",
                    "text": "View on Amazon",
                    "url": alert.record.url,
                }],
            }]
        })
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    fn channel(&self) -> &'static str {
        "slack"
    }

    async fn send(&self, alert: &Alert) -> Result<(), AlertError> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&Self::payload(alert))
            .send()
            .await?;
        check_status(self.channel(), response).await
    }
}

/// Telegram Bot API `sendMessage`.
pub struct TelegramNotifier {
    client: Arc<reqwest::Client>,
    api_base: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    /// Sends as bot `bot_token` to `chat_id`.
    pub fn new(
        client: Arc<reqwest::Client>,
        bot_token: impl Into<String>,
        chat_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_base: TELEGRAM_API_BASE.to_string(),
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
        }
    }

    /// Overrides the API base URL (self-hosted Bot API server, tests).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn channel(&self) -> &'static str {
        "telegram"
    }

    async fn send(&self, alert: &Alert) -> Result<(), AlertError> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.bot_token);
        let response = self
            .client
            .post(url)
            .json(&json!({"chat_id": self.chat_id, "text": alert.text()}))
            .send()
            .await?;
        check_status(self.channel(), response).await
    }
}

/// Pushover push notification.
pub struct PushoverNotifier {
    client: Arc<reqwest::Client>,
    endpoint: String,
    user_key: String,
    api_token: String,
}

impl PushoverNotifier {
    /// Pushes to `user_key` with application token `api_token`.
    pub fn new(
        client: Arc<reqwest::Client>,
        user_key: impl Into<String>,
        api_token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: PUSHOVER_ENDPOINT.to_string(),
            user_key: user_key.into(),
            api_token: api_token.into(),
        }
    }

    /// Overrides the messages endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl Notifier for PushoverNotifier {
    fn channel(&self) -> &'static str {
        "push"
    }

    async fn send(&self, alert: &Alert) -> Result<(), AlertError> {
        let title = match alert.kind {
            AlertKind::PriceDrop { .. } => "Price Drop Alert",
            AlertKind::BackInStock => "Stock Alert",
        };
        let form = [
            ("token", self.api_token.clone()),
            ("user", self.user_key.clone()),
            ("title", title.to_string()),
            ("message", alert.summary()),
            ("url", alert.record.url.clone()),
            ("url_title", "View on Amazon".to_string()),
        ];
        let response = self
            .client
            .post(&self.endpoint)
            .form(&form)
            .send()
            .await?;
        check_status(self.channel(), response).await
    }
}

/// Twilio text message.
pub struct SmsNotifier {
    client: Arc<reqwest::Client>,
    api_base: String,
    account_sid: String,
    auth_token: String,
    from: String,
    to: String,
}

impl SmsNotifier {
    /// Sends from the Twilio number `from` to `to`.
    pub fn new(
        client: Arc<reqwest::Client>,
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_base: TWILIO_API_BASE.to_string(),
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            from: from.into(),
            to: to.into(),
        }
    }

    /// Overrides the API base URL.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base, self.account_sid
        )
    }
}

#[async_trait]
impl Notifier for SmsNotifier {
    fn channel(&self) -> &'static str {
        "sms"
    }

    async fn send(&self, alert: &Alert) -> Result<(), AlertError> {
        let form = [
            ("From", self.from.clone()),
            ("To", self.to.clone()),
            ("Body", alert.sms_text()),
        ];
        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&form)
            .send()
            .await?;
        check_status(self.channel(), response).await
    }
}

/// Plain-text email through an SMTP relay.
pub struct EmailNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl EmailNotifier {
    /// Sends through Gmail over implicit TLS, authenticated with an app password.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::Address` when `username` or `receiver` is not an
    /// email address.
    pub fn gmail(
        username: &str,
        app_password: impl Into<String>,
        receiver: &str,
    ) -> Result<Self, AlertError> {
        let from: Mailbox = username.trim().parse()?;
        let to: Mailbox = receiver.trim().parse()?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(GMAIL_SMTP_RELAY)?
            .credentials(Credentials::new(username.trim().to_string(), app_password.into()))
            .timeout(Some(ALERT_REQUEST_TIMEOUT))
            .build();
        Ok(Self::with_transport(transport, from, to))
    }

    /// Sends through `transport`.
    pub fn with_transport(
        transport: AsyncSmtpTransport<Tokio1Executor>,
        from: Mailbox,
        to: Mailbox,
    ) -> Self {
        Self {
            transport,
            from,
            to,
        }
    }

    fn message(&self, alert: &Alert) -> Result<Message, AlertError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(alert.subject())
            .header(ContentType::TEXT_PLAIN)
            .body(alert.text())?;
        Ok(message)
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn channel(&self) -> &'static str {
        "email"
    }

    async fn send(&self, alert: &Alert) -> Result<(), AlertError> {
        let message = self.message(alert)?;
        self.transport.send(message).await?;
        Ok(())
    }
}

/// Writes alerts to the log. Always available.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn channel(&self) -> &'static str {
        "log"
    }

    async fn send(&self, alert: &Alert) -> Result<(), AlertError> {
        log::warn!(
            "{} {} | {}",
            alert.headline(),
            alert.record.asin,
            alert.summary().replace('\n', " | ")
        );
        Ok(())
    }
}
