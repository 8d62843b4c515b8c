//! price_tracker library: resilient product price and stock tracking
//!
//! This library fetches retail product pages through a warmed-up, rotating
//! browser-like session, extracts title, price, stock, rating and review
//! count, appends each successful check to a CSV history, and sends price-drop
//! and back-in-stock alerts.
//!
//! # Example
//!
//! ```no_run
//! use price_tracker::{run_cycle, Config};
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     products_path: std::path::PathBuf::from("data/products.json"),
//!     ..Default::default()
//! };
//!
//! let report = run_cycle(&config, &CancellationToken::new()).await?;
//! println!("Checked {} products: {} recorded, {} skipped",
//!          report.total_products, report.recorded, report.skipped);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

#![warn(missing_docs)]

pub mod alerts;
pub mod app;
pub mod config;
pub mod error_handling;
pub mod fetch;
pub mod history;
pub mod initialization;
pub mod parse;
pub mod profile;
pub mod registry;
mod utils;

// Re-export public API
pub use config::{Config, FetchConfig, LogFormat, LogLevel, Opt};
pub use fetch::{FetchReport, Fetcher};
pub use parse::{Extractor, ProductRecord};
pub use run::{run_cycle, run_cycle_with, CycleReport, CycleResources};

// Internal run module (contains the per-cycle product loop)
mod run {
    use anyhow::{Context, Result};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    use futures::stream::FuturesUnordered;
    use futures::StreamExt;
    use log::{info, warn};
    use tokio_util::sync::CancellationToken;

    use crate::alerts::{Alert, AlertEvaluator, AlertManager};
    use crate::app::print_cycle_statistics;
    use crate::config::Config;
    use crate::error_handling::{FailureKind, InfoType, ProcessingStats};
    use crate::fetch::{pause_unless_cancelled, sample_between, Fetcher, Pacer, PauseReason, TokioPacer};
    use crate::history::HistoryWriter;
    use crate::initialization::{init_alert_client, init_semaphore};
    use crate::parse::{Extractor, ProductRecord};
    use crate::registry::{ProductRegistry, TrackedProduct};

    /// Results of one scrape cycle.
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct CycleReport {
        /// Enabled products at the start of the cycle
        pub total_products: usize,
        /// Products with a record written to history
        pub recorded: usize,
        /// Products skipped (fetch failed, no record, or cancelled)
        pub skipped: usize,
        /// Records extracted but not written to history
        pub history_failures: usize,
        /// Alerts delivered to at least one channel
        pub alerts_sent: usize,
        /// Whether the cycle was cut short by cancellation
        pub cancelled: bool,
        /// Elapsed time in seconds
        pub elapsed_seconds: f64,
    }

    /// Collaborators shared by every product of a cycle.
    pub struct CycleResources {
        /// Page fetcher
        pub fetcher: Arc<Fetcher>,
        /// Record extractor
        pub extractor: Arc<Extractor>,
        /// Alert delivery
        pub alerts: Arc<AlertManager>,
        /// Pauses between products
        pub pacer: Arc<dyn Pacer>,
        /// Counters reported at the end of the cycle
        pub stats: Arc<ProcessingStats>,
    }

    impl CycleResources {
        /// Builds the production collaborators: `reqwest` sessions, the
        /// tokio timer and alert channels from the environment.
        ///
        /// # Errors
        ///
        /// Returns an error if the fetch configuration is invalid or the
        /// alert HTTP client cannot be built.
        pub fn from_config(config: &Config) -> Result<Self> {
            let stats = Arc::new(ProcessingStats::new());
            let fetcher = Fetcher::with_http(config.fetch.clone())
                .context("Invalid fetch configuration")?
                .with_stats(Arc::clone(&stats));
            let extractor = Extractor::new(&config.fetch).with_stats(Arc::clone(&stats));
            let client = init_alert_client().context("Failed to initialize alert HTTP client")?;
            Ok(Self {
                fetcher: Arc::new(fetcher),
                extractor: Arc::new(extractor),
                alerts: Arc::new(AlertManager::from_env(client)),
                pacer: Arc::new(TokioPacer),
                stats,
            })
        }
    }

    /// What one product task hands back to the cycle loop.
    struct ProductOutcome {
        product: TrackedProduct,
        record: Option<ProductRecord>,
        cancelled: bool,
    }

    /// Runs one scrape cycle over every enabled product.
    ///
    /// # Arguments
    ///
    /// * `config` - Paths, concurrency, pacing and fetch settings
    /// * `cancel` - Stops the cycle at the next pause or network call
    ///
    /// # Returns
    ///
    /// A `CycleReport`. Individual product failures are counted, never
    /// returned as errors.
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - The fetch configuration is invalid
    /// - The product registry cannot be opened or read
    /// - The alert HTTP client cannot be built
    pub async fn run_cycle(config: &Config, cancel: &CancellationToken) -> Result<CycleReport> {
        let resources = CycleResources::from_config(config)?;
        run_cycle_with(config, resources, cancel).await
    }

    /// Runs one scrape cycle with explicit collaborators.
    ///
    /// Products are fetched by at most `config.max_concurrency` workers.
    /// A worker that finishes a product pauses for a random
    /// `config.product_delay` while it still holds its slot, unless no product
    /// is left waiting to start. Records are written to history, stamped on
    /// the registry and evaluated for alerts as they complete.
    ///
    /// # Errors
    ///
    /// Returns an error if the product registry cannot be opened or read.
    pub async fn run_cycle_with(
        config: &Config,
        resources: CycleResources,
        cancel: &CancellationToken,
    ) -> Result<CycleReport> {
        let start_time = Instant::now();
        let registry = ProductRegistry::open(&config.products_path)
            .context("Failed to open product registry")?;
        let products = registry
            .enabled_products()
            .context("Failed to load enabled products")?;
        let history = HistoryWriter::new(&config.history_path);

        let mut report = CycleReport {
            total_products: products.len(),
            ..Default::default()
        };
        if products.is_empty() {
            warn!(
                "No enabled products in {}. Import some with --import-csv.",
                config.products_path.display()
            );
            return Ok(report);
        }
        info!("Starting cycle over {} products", products.len());

        let semaphore = init_semaphore(config.max_concurrency);
        let waiting = Arc::new(AtomicUsize::new(products.len()));
        let mut tasks = FuturesUnordered::new();

        for product in products {
            let semaphore = Arc::clone(&semaphore);
            let waiting = Arc::clone(&waiting);
            let fetcher = Arc::clone(&resources.fetcher);
            let extractor = Arc::clone(&resources.extractor);
            let pacer = Arc::clone(&resources.pacer);
            let stats = Arc::clone(&resources.stats);
            let cancel = cancel.clone();
            let product_delay = config.product_delay;

            tasks.push(tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    warn!("Semaphore closed, skipping {}", product.asin);
                    return ProductOutcome {
                        product,
                        record: None,
                        cancelled: false,
                    };
                };
                waiting.fetch_sub(1, Ordering::SeqCst);
                if cancel.is_cancelled() {
                    return ProductOutcome {
                        product,
                        record: None,
                        cancelled: true,
                    };
                }

                info!("Checking {} ({})", product.name, product.asin);
                let fetched = fetcher.fetch_report(&product.asin, &cancel).await;
                let record = match fetched.body {
                    Some(body) => {
                        let record = extractor.extract(&body, &product.asin);
                        if record.is_none() {
                            stats.increment_failure(FailureKind::ExtractionFailure);
                        }
                        record
                    }
                    None => {
                        if let Some(kind) = fetched.last_failure {
                            stats.increment_failure(kind);
                        }
                        if !fetched.cancelled {
                            warn!(
                                "Skipping {} this cycle: {}",
                                product.asin,
                                fetched
                                    .last_failure
                                    .map(|kind| kind.as_str())
                                    .unwrap_or("no response")
                            );
                        }
                        None
                    }
                };

                // Spacing follows processing order, not spawn order
                if waiting.load(Ordering::SeqCst) > 0 {
                    let delay = {
                        let mut rng = rand::rng();
                        sample_between(&mut rng, product_delay)
                    };
                    pause_unless_cancelled(
                        pacer.as_ref(),
                        delay,
                        PauseReason::ProductSpacing,
                        &cancel,
                    )
                    .await;
                }

                ProductOutcome {
                    product,
                    record,
                    cancelled: fetched.cancelled,
                }
            }));
        }

        let evaluator = AlertEvaluator;
        while let Some(task_result) = tasks.next().await {
            let outcome = match task_result {
                Ok(outcome) => outcome,
                Err(join_error) => {
                    report.skipped += 1;
                    warn!("Product task panicked: {:?}", join_error);
                    continue;
                }
            };
            report.cancelled |= outcome.cancelled;

            let Some(record) = outcome.record else {
                report.skipped += 1;
                continue;
            };
            let product = outcome.product;

            match history.append(&record) {
                Ok(row) => {
                    report.recorded += 1;
                    if let Err(e) = registry.update_last_checked(&product.asin, &row.timestamp) {
                        warn!("Failed to update last check of {}: {}", product.asin, e);
                    }
                }
                Err(e) => {
                    report.history_failures += 1;
                    log::error!("Failed to write history for {}: {}", product.asin, e);
                }
            }
            info!(
                "{}: price={} stock={}",
                product.asin,
                record.price_raw.as_deref().unwrap_or("N/A"),
                record.stock
            );

            for kind in evaluator.evaluate(&product, &record) {
                let alert = Alert::new(kind, record.clone());
                resources.stats.increment_info(match kind {
                    crate::alerts::AlertKind::PriceDrop { .. } => InfoType::PriceAlert,
                    crate::alerts::AlertKind::BackInStock => InfoType::StockAlert,
                });
                let delivery = resources
                    .alerts
                    .dispatch(&alert, &product.alert_channels)
                    .await;
                if !delivery.sent.is_empty() {
                    report.alerts_sent += 1;
                }
            }
        }

        report.cancelled |= cancel.is_cancelled();
        report.elapsed_seconds = start_time.elapsed().as_secs_f64();
        print_cycle_statistics(&report, &resources.stats);
        Ok(report)
    }
}
