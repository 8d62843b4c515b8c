//! Configuration constants.
//!
//! This module defines the defaults used throughout the application, including
//! retry and backoff parameters, pacing delays, block signatures, and file paths.

use std::time::Duration;

/// Canonical product URL template. `{id}` is replaced by the target identifier (ASIN).
pub const DEFAULT_URL_TEMPLATE: &str = "https://www.amazon.com/dp/{id}";

/// Placeholder substituted with the target identifier in the URL template.
pub const URL_TEMPLATE_PLACEHOLDER: &str = "{id}";

/// Pages visited, in order, before the real request to build an organic-looking session.
///
/// Landing page first, then a category page.
pub const DEFAULT_WARMUP_URLS: &[&str] = &[
    "https://www.amazon.com/",
    "https://www.amazon.com/books-used-books-textbooks/b?node=283155",
];

/// Referer sent with product requests (the site landing page).
pub const DEFAULT_REFERER: &str = "https://www.amazon.com/";

// Retry strategy
/// Number of fetch attempts per target (initial attempt included).
pub const DEFAULT_RETRY_COUNT: u32 = 3;
/// Linear backoff base; the pause after attempt `n` is `base * n`.
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_secs(3);
/// Upper bound of the random jitter added to each backoff pause.
/// Always clamped strictly below the backoff base so pauses keep increasing.
pub const DEFAULT_BACKOFF_JITTER: Duration = Duration::from_millis(500);

// Network operation timeouts
/// Per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
/// TCP connection timeout
pub const TCP_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

// Pacing
/// Randomized pause before every product request (min, max).
pub const DEFAULT_REQUEST_JITTER: (Duration, Duration) =
    (Duration::from_secs(1), Duration::from_secs(3));
/// Randomized dwell between warm-up steps (min, max).
pub const DEFAULT_WARMUP_DWELL: (Duration, Duration) =
    (Duration::from_secs(2), Duration::from_secs(4));
/// Randomized pause between two products of the same cycle (min, max).
pub const DEFAULT_PRODUCT_DELAY: (Duration, Duration) =
    (Duration::from_secs(5), Duration::from_secs(10));

/// Default number of products fetched in parallel. Each product's own attempts
/// remain sequential regardless of this value.
pub const DEFAULT_MAX_CONCURRENCY: usize = 1;

/// Default scheduler interval in minutes (used with `--loop`).
pub const DEFAULT_INTERVAL_MINUTES: u64 = 30;

/// Response-body substrings indicating an anti-automation challenge.
///
/// Matched case-insensitively. Union of the signature lists used by both
/// scraper variants; entries must be lower-case.
pub const BLOCK_SIGNATURES: &[&str] = &[
    "enter the characters you see below",
    "automated access",
    "robot check",
    "sorry, we just need to make sure you're not a robot",
    "api-services-support@amazon.com",
    "type the characters you see in this image",
    "/errors/validatecaptcha",
];

/// Markers whose presence indicates a real product page (case-sensitive).
pub const CONTENT_MARKERS: &[&str] = &["productTitle", "corePrice"];

/// Stock value used when no availability element is found.
pub const UNKNOWN_STOCK: &str = "Unknown";

/// Currency symbols understood by the price normalizer and buy-box rule.
pub const CURRENCY_SYMBOLS: &[char] = &['$', '£', '€'];

// File paths
/// Tracked product registry (JSON)
pub const PRODUCTS_DB_PATH: &str = "data/products.json";
/// Price/stock time series (CSV)
pub const HISTORY_CSV_PATH: &str = "data/history.csv";

/// Channel used when a product does not list any alert channel.
pub const DEFAULT_ALERT_CHANNEL: &str = "email";

// Alert delivery retry strategy
/// Initial delay in milliseconds before the first delivery retry
pub const ALERT_RETRY_INITIAL_DELAY_MS: u64 = 500;
/// Factor by which the delivery retry delay is multiplied on each attempt
pub const ALERT_RETRY_FACTOR: u64 = 2;
/// Maximum delay between delivery retries in seconds
pub const ALERT_RETRY_MAX_DELAY_SECS: u64 = 10;
/// Maximum number of delivery retries
pub const ALERT_RETRY_MAX_ATTEMPTS: usize = 3;
/// Alert delivery request timeout
pub const ALERT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum title length in characters shown in alert messages
pub const MAX_ALERT_TITLE_CHARS: usize = 100;
/// Maximum title length in characters in an email subject
pub const EMAIL_SUBJECT_TITLE_CHARS: usize = 50;
/// Maximum title length in characters in a text message
pub const SMS_TITLE_CHARS: usize = 40;
/// Gmail SMTP relay, implicit TLS on port 465
pub const GMAIL_SMTP_RELAY: &str = "smtp.gmail.com";

// HTTP status codes (for clarity and consistency)
/// Rate-limited response status, retried by alert delivery
pub const HTTP_STATUS_TOO_MANY_REQUESTS: u16 = 429;
