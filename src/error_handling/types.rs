//! Error type definitions.
//!
//! This module defines all error, warning, and info types used throughout the application.

use lettre::address::AddressError;
use lettre::transport::smtp::Error as SmtpError;
use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),

    /// Invalid configuration supplied at startup.
    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),
}

/// Invalid configuration values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The product URL template has no `{id}` placeholder.
    #[error("URL template '{0}' has no {{id}} placeholder")]
    MissingPlaceholder(String),

    /// A field holds a value outside its accepted domain.
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue {
        /// Offending field name
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },

    /// A (min, max) range has min > max.
    #[error("Range {0} has its minimum above its maximum")]
    InvertedRange(&'static str),

    /// The request profile pool is too small or contains an inconsistent profile.
    #[error("Invalid request profile pool: {0}")]
    ProfilePool(String),
}

/// Network-level failure of a single request.
///
/// Produced by a [`Transport`](crate::fetch::Transport); the fetch loop treats
/// every variant as retriable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request did not complete within the configured timeout.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// DNS resolution or TCP/TLS connection failed.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The response body could not be read or decoded.
    #[error("failed to read response body: {0}")]
    Body(String),

    /// The request could not be built (invalid URL, invalid header value).
    #[error("invalid request: {0}")]
    Builder(String),

    /// Any other request failure.
    #[error("request failed: {0}")]
    Other(String),
}

/// Whole-document extraction failure.
///
/// Missing individual fields never produce this error; only documents that
/// cannot yield a trustworthy record do.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionFailure {
    /// Empty or whitespace-only markup: no navigable tree can be built.
    #[error("document is empty")]
    EmptyDocument,

    /// No title found and the markup carries a block signature.
    #[error("document is a challenge page (matched '{signature}')")]
    Blocked {
        /// The matched block signature
        signature: String,
    },
}

/// Errors raised by the tracked-product registry.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Filesystem error reading or writing the registry.
    #[error("Registry I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The registry file is not valid JSON.
    #[error("Registry JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV import/export error.
    #[error("Registry CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A product with this ASIN is already tracked.
    #[error("Product {0} already exists")]
    DuplicateAsin(String),

    /// No product with this ASIN is tracked.
    #[error("Product {0} not found")]
    NotFound(String),
}

/// Errors raised by the history writer.
#[derive(Error, Debug)]
pub enum HistoryError {
    /// Filesystem error.
    #[error("History I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding or decoding error.
    #[error("History CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Errors raised while delivering an alert to one channel.
#[derive(Error, Debug)]
pub enum AlertError {
    /// HTTP error talking to the channel endpoint.
    #[error("Alert delivery HTTP error: {0}")]
    Http(#[from] ReqwestError),

    /// The endpoint answered with a non-success status.
    #[error("{channel} rejected alert with status {status}")]
    Rejected {
        /// Channel name
        channel: &'static str,
        /// HTTP status returned
        status: u16,
    },

    /// The channel is enabled but a credential is missing.
    #[error("{channel} is enabled but {variable} is not set")]
    MissingCredential {
        /// Channel name
        channel: &'static str,
        /// Environment variable expected to hold the credential
        variable: &'static str,
    },

    /// SMTP error talking to the mail relay.
    #[error("Alert delivery SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// The email message could not be built.
    #[error("Alert email could not be built: {0}")]
    Message(#[from] lettre::error::Error),

    /// A configured email address does not parse.
    #[error("Invalid email address: {0}")]
    Address(#[from] AddressError),
}

/// Terminal reason classes for a skipped or degraded cycle.
///
/// Counted per cycle and reported in the end-of-cycle statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum FailureKind {
    /// Anti-bot signature matched on every attempt.
    Blocked,
    /// Response lacked the expected content markers.
    Malformed,
    /// Network, timeout or connection fault.
    TransportError,
    /// Document in hand but no usable record.
    ExtractionFailure,
    /// A single field failed to parse (does not fail the record).
    NormalizationMiss,
}

/// Fields the extractor could not locate with any strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
#[allow(clippy::enum_variant_names)] // Every variant is a missing field
pub enum WarningType {
    /// No title strategy matched
    MissingTitle,
    /// No price strategy matched
    MissingPrice,
    /// No stock strategy matched; stock defaults to `Unknown`
    MissingStock,
    /// No rating strategy matched
    MissingRating,
    /// No review count strategy matched
    MissingReviews,
}

/// Notable events that are neither failures nor warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum InfoType {
    /// Warm-up aborted; the fetch continued with an empty cookie jar.
    WarmupFailed,
    /// Synthetic session cookies were injected because warm-up did not set them.
    SyntheticCookies,
    /// A fetch succeeded after at least one retry.
    RecoveredAfterRetry,
    /// Price at or below target.
    PriceAlert,
    /// Product back in stock.
    StockAlert,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FailureKind {
    /// Label used in logs and statistics.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Blocked => "Blocked",
            FailureKind::Malformed => "Malformed",
            FailureKind::TransportError => "Transport error",
            FailureKind::ExtractionFailure => "Extraction failure",
            FailureKind::NormalizationMiss => "Normalization miss",
        }
    }
}

impl WarningType {
    /// Returns a human-readable string representation of the warning type.
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningType::MissingTitle => "Missing title",
            WarningType::MissingPrice => "Missing price",
            WarningType::MissingStock => "Missing stock status",
            WarningType::MissingRating => "Missing rating",
            WarningType::MissingReviews => "Missing review count",
        }
    }
}

impl InfoType {
    /// Returns a human-readable string representation of the info type.
    pub fn as_str(&self) -> &'static str {
        match self {
            InfoType::WarmupFailed => "Warm-up failed",
            InfoType::SyntheticCookies => "Synthetic session cookies",
            InfoType::RecoveredAfterRetry => "Recovered after retry",
            InfoType::PriceAlert => "Price alert",
            InfoType::StockAlert => "Stock alert",
        }
    }
}
