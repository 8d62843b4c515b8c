//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and configuration. Components receive these structs at construction time;
//! nothing here is process-global.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::config::constants::*;
use crate::error_handling::ConfigError;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// Controls how log messages are formatted:
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Fetch pipeline configuration.
///
/// Passed to the [`Fetcher`](crate::Fetcher) at construction. Two fetchers
/// with different configurations can run side by side (tests rely on this).
///
/// # Examples
///
/// ```
/// use price_tracker::FetchConfig;
/// use std::time::Duration;
///
/// let config = FetchConfig {
///     retry_count: 5,
///     backoff_base: Duration::from_secs(2),
///     ..Default::default()
/// };
/// assert_eq!(config.product_url("B08N5WRWNW"), "https://www.amazon.com/dp/B08N5WRWNW");
/// ```
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Canonical product URL with an `{id}` placeholder
    pub url_template: String,

    /// Pages visited (in order) before the product request
    pub warmup_urls: Vec<String>,

    /// Referer header sent with product requests
    pub referer: String,

    /// Number of attempts per fetch (initial attempt included)
    pub retry_count: u32,

    /// Linear backoff base: pause after attempt `n` is `backoff_base * n`
    pub backoff_base: Duration,

    /// Upper bound of random jitter added to each backoff pause
    pub backoff_jitter: Duration,

    /// Per-request timeout
    pub request_timeout: Duration,

    /// Random pause before every product request (min, max)
    pub request_jitter: (Duration, Duration),

    /// Random dwell between warm-up steps (min, max)
    pub warmup_dwell: (Duration, Duration),

    /// Lower-case substrings identifying a challenge page
    pub block_signatures: Vec<String>,

    /// Substrings identifying a real product page
    pub content_markers: Vec<String>,

    /// Seed for the per-invocation random source. `None` uses OS entropy.
    pub rng_seed: Option<u64>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            url_template: DEFAULT_URL_TEMPLATE.to_string(),
            warmup_urls: DEFAULT_WARMUP_URLS.iter().map(|s| s.to_string()).collect(),
            referer: DEFAULT_REFERER.to_string(),
            retry_count: DEFAULT_RETRY_COUNT,
            backoff_base: DEFAULT_BACKOFF_BASE,
            backoff_jitter: DEFAULT_BACKOFF_JITTER,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            request_jitter: DEFAULT_REQUEST_JITTER,
            warmup_dwell: DEFAULT_WARMUP_DWELL,
            block_signatures: BLOCK_SIGNATURES.iter().map(|s| s.to_string()).collect(),
            content_markers: CONTENT_MARKERS.iter().map(|s| s.to_string()).collect(),
            rng_seed: None,
        }
    }
}

impl FetchConfig {
    /// Builds the canonical product URL for a target identifier.
    pub fn product_url(&self, target_id: &str) -> String {
        self.url_template
            .replace(URL_TEMPLATE_PLACEHOLDER, target_id.trim())
    }

    /// Checks the configuration for values the fetch loop cannot work with.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` describing the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.url_template.contains(URL_TEMPLATE_PLACEHOLDER) {
            return Err(ConfigError::MissingPlaceholder(self.url_template.clone()));
        }
        if self.retry_count == 0 {
            return Err(ConfigError::InvalidValue {
                field: "retry_count",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.request_jitter.0 > self.request_jitter.1 {
            return Err(ConfigError::InvertedRange("request_jitter"));
        }
        if self.warmup_dwell.0 > self.warmup_dwell.1 {
            return Err(ConfigError::InvertedRange("warmup_dwell"));
        }
        if self
            .block_signatures
            .iter()
            .any(|s| s.is_empty() || s.to_lowercase() != *s)
        {
            return Err(ConfigError::InvalidValue {
                field: "block_signatures",
                reason: "signatures must be non-empty and lower-case".to_string(),
            });
        }
        if self.content_markers.iter().all(|m| m.is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "content_markers",
                reason: "at least one non-empty marker is required".to_string(),
            });
        }
        Ok(())
    }
}

/// Application configuration (no CLI dependencies).
///
/// # Examples
///
/// ```no_run
/// use price_tracker::Config;
/// use std::path::PathBuf;
///
/// let config = Config {
///     products_path: PathBuf::from("data/products.json"),
///     max_concurrency: 2,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Tracked product registry (JSON)
    pub products_path: PathBuf,

    /// History time series (CSV)
    pub history_path: PathBuf,

    /// Log level
    pub log_level: LogLevel,

    /// Log format
    pub log_format: LogFormat,

    /// Products fetched in parallel
    pub max_concurrency: usize,

    /// Random pause between products (min, max)
    pub product_delay: (Duration, Duration),

    /// Scheduler interval in minutes
    pub interval_minutes: u64,

    /// Fetch pipeline settings
    pub fetch: FetchConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            products_path: PathBuf::from(PRODUCTS_DB_PATH),
            history_path: PathBuf::from(HISTORY_CSV_PATH),
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            product_delay: DEFAULT_PRODUCT_DELAY,
            interval_minutes: DEFAULT_INTERVAL_MINUTES,
            fetch: FetchConfig::default(),
        }
    }
}

/// Command-line options.
///
/// # Examples
///
/// ```bash
/// # Single scrape cycle over all enabled products
/// price_tracker
///
/// # Run every 15 minutes
/// price_tracker --loop --interval-minutes 15
///
/// # Manage the registry
/// price_tracker --import-csv products.csv
/// price_tracker --list
/// ```
#[derive(Debug, Parser)]
#[command(
    name = "price_tracker",
    about = "Tracks product prices and stock, stores history, and sends alerts."
)]
pub struct Opt {
    /// Run continuously with a schedule instead of a single run
    #[arg(long = "loop")]
    pub run_loop: bool,

    /// Interval in minutes for scheduled scraping (used with --loop)
    #[arg(long, default_value_t = DEFAULT_INTERVAL_MINUTES)]
    pub interval_minutes: u64,

    /// Import products from a CSV file (columns: asin, name, target_price)
    #[arg(long, value_parser)]
    pub import_csv: Option<PathBuf>,

    /// Export products to a CSV file
    #[arg(long, value_parser)]
    pub export_csv: Option<PathBuf>,

    /// List all tracked products
    #[arg(long)]
    pub list: bool,

    /// Product registry path (JSON)
    #[arg(long, value_parser, default_value = PRODUCTS_DB_PATH)]
    pub products: PathBuf,

    /// History path (CSV)
    #[arg(long, value_parser, default_value = HISTORY_CSV_PATH)]
    pub history: PathBuf,

    /// Fetch attempts per product
    #[arg(long, default_value_t = DEFAULT_RETRY_COUNT)]
    pub retries: u32,

    /// Linear backoff base in seconds
    #[arg(long, default_value_t = DEFAULT_BACKOFF_BASE.as_secs())]
    pub backoff_seconds: u64,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT.as_secs())]
    pub timeout_seconds: u64,

    /// Products fetched in parallel (each product's attempts stay sequential)
    #[arg(long, default_value_t = DEFAULT_MAX_CONCURRENCY)]
    pub max_concurrency: usize,

    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,
}

impl From<&Opt> for Config {
    fn from(opt: &Opt) -> Self {
        let defaults = Config::default();
        Config {
            products_path: opt.products.clone(),
            history_path: opt.history.clone(),
            log_level: opt.log_level.clone(),
            log_format: opt.log_format.clone(),
            max_concurrency: opt.max_concurrency.max(1),
            interval_minutes: opt.interval_minutes.max(1),
            fetch: FetchConfig {
                retry_count: opt.retries,
                backoff_base: Duration::from_secs(opt.backoff_seconds),
                request_timeout: Duration::from_secs(opt.timeout_seconds),
                ..FetchConfig::default()
            },
            ..defaults
        }
    }
}
