//! Whole-cycle tests: registry in, history and alerts out.

mod helpers;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use helpers::*;
use price_tracker::alerts::AlertManager;
use price_tracker::error_handling::{FailureKind, InfoType, ProcessingStats};
use price_tracker::fetch::{Pacer, PauseReason};
use price_tracker::history::HistoryWriter;
use price_tracker::profile::ProfileRotator;
use price_tracker::registry::{ProductRegistry, TrackedProduct};
use price_tracker::{run_cycle_with, Config, CycleResources, Extractor, Fetcher};

struct Harness {
    dir: TempDir,
    config: Config,
    registry: ProductRegistry,
    pacer: Arc<RecordingPacer>,
    stats: Arc<ProcessingStats>,
}

impl Harness {
    fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        let config = Config {
            products_path: dir.path().join("products.json"),
            history_path: dir.path().join("history.csv"),
            product_delay: (Duration::from_secs(5), Duration::from_secs(10)),
            fetch: test_fetch_config(),
            ..Default::default()
        };
        let registry = ProductRegistry::open(&config.products_path).expect("open registry");
        Self {
            dir,
            config,
            registry,
            pacer: Arc::new(RecordingPacer::new()),
            stats: Arc::new(ProcessingStats::new()),
        }
    }

    fn resources(&self, connector: ScriptedConnector) -> CycleResources {
        let fetcher = Fetcher::new(
            self.config.fetch.clone(),
            Arc::new(ProfileRotator::default()),
            Arc::new(connector),
            self.pacer.clone(),
        )
        .expect("valid fetch config")
        .with_stats(Arc::clone(&self.stats));
        CycleResources {
            fetcher: Arc::new(fetcher),
            extractor: Arc::new(
                Extractor::new(&self.config.fetch).with_stats(Arc::clone(&self.stats)),
            ),
            alerts: Arc::new(AlertManager::new()),
            pacer: self.pacer.clone(),
            stats: Arc::clone(&self.stats),
        }
    }
}

#[tokio::test]
async fn test_cycle_records_success_and_skips_blocked() {
    let harness = Harness::new();
    harness
        .registry
        .add_product(
            TrackedProduct::new("B0SKILLET", "Skillet")
                .with_target_price(Some(40.0))
                .with_stock_alert(true),
        )
        .expect("add");
    harness
        .registry
        .add_product(TrackedProduct::new("B0BLOCKED", "Blocked item"))
        .expect("add");
    let mut disabled = TrackedProduct::new("B0OFF", "Disabled item");
    disabled.enabled = false;
    harness.registry.add_product(disabled).expect("add");

    let connector = ScriptedConnector::new(Vec::new())
        .route("B0SKILLET", vec![success()])
        .route("B0BLOCKED", vec![blocked(), blocked(), blocked()]);
    let resources = harness.resources(connector);

    let report = run_cycle_with(&harness.config, resources, &CancellationToken::new())
        .await
        .expect("cycle");

    assert_eq!(report.total_products, 2);
    assert_eq!(report.recorded, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.alerts_sent, 2);
    assert!(!report.cancelled);

    let history = HistoryWriter::new(&harness.config.history_path)
        .load_history()
        .expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].asin, "B0SKILLET");
    assert_eq!(history[0].price, Some(34.95));
    assert_eq!(history[0].stock, "In Stock");

    let skillet = harness
        .registry
        .get_product("B0SKILLET")
        .expect("get")
        .expect("tracked");
    assert_eq!(skillet.last_checked.as_deref(), Some(history[0].timestamp.as_str()));
    let blocked = harness
        .registry
        .get_product("B0BLOCKED")
        .expect("get")
        .expect("tracked");
    assert_eq!(blocked.last_checked, None);

    assert_eq!(harness.stats.get_failure_count(FailureKind::Blocked), 1);
    assert_eq!(harness.stats.get_info_count(InfoType::PriceAlert), 1);
    assert_eq!(harness.stats.get_info_count(InfoType::StockAlert), 1);

    // One spacing pause between the two products, none after the last
    assert_eq!(harness.pacer.count(PauseReason::ProductSpacing), 1);
}

#[tokio::test]
async fn test_empty_registry_is_not_an_error() {
    let harness = Harness::new();
    let resources = harness.resources(ScriptedConnector::new(Vec::new()));

    let report = run_cycle_with(&harness.config, resources, &CancellationToken::new())
        .await
        .expect("cycle");
    assert_eq!(report.total_products, 0);
    assert_eq!(report.recorded, 0);
}

#[tokio::test]
async fn test_cancelled_cycle_writes_nothing() {
    let harness = Harness::new();
    harness
        .registry
        .add_product(TrackedProduct::new("B0SKILLET", "Skillet"))
        .expect("add");
    let connector = ScriptedConnector::new(Vec::new()).route("B0SKILLET", vec![success()]);
    let log = Arc::clone(&connector.log);
    let resources = harness.resources(connector);

    let cancel = CancellationToken::new();
    cancel.cancel();
    let report = run_cycle_with(&harness.config, resources, &cancel)
        .await
        .expect("cycle");

    assert!(report.cancelled);
    assert_eq!(report.recorded, 0);
    assert_eq!(log.connects(), 0);
    assert!(HistoryWriter::new(&harness.config.history_path)
        .load_history()
        .expect("history")
        .is_empty());
}

/// Pacer that notes how many product pages had been requested whenever a
/// spacing pause starts.
struct SpacingPacer {
    log: Arc<ScriptLog>,
    fetched_at_pause: Mutex<Vec<usize>>,
}

#[async_trait]
impl Pacer for SpacingPacer {
    async fn pause(&self, _duration: Duration, reason: PauseReason) {
        if reason == PauseReason::ProductSpacing {
            let fetched = self.log.product_requests().len();
            self.fetched_at_pause.lock().expect("pause log").push(fetched);
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_spacing_pause_between_every_pair_of_products() {
    for _ in 0..10 {
        let harness = Harness::new();
        let asins: Vec<String> = (0..12).map(|i| format!("A{:02}", i)).collect();
        for asin in &asins {
            harness
                .registry
                .add_product(TrackedProduct::new(asin.as_str(), "Spaced item"))
                .expect("add");
        }

        let connector = ScriptedConnector::new((0..asins.len()).map(|_| success()).collect());
        let log = Arc::clone(&connector.log);
        let spacing = Arc::new(SpacingPacer {
            log: Arc::clone(&log),
            fetched_at_pause: Mutex::new(Vec::new()),
        });
        let mut resources = harness.resources(connector);
        resources.pacer = spacing.clone();

        let report = run_cycle_with(&harness.config, resources, &CancellationToken::new())
            .await
            .expect("cycle");
        assert_eq!(report.recorded, asins.len());

        // With one worker, the k-th pause starts right after the k-th fetch
        let fetched_at_pause = spacing.fetched_at_pause.lock().expect("pause log").clone();
        let expected: Vec<usize> = (1..asins.len()).collect();
        assert_eq!(fetched_at_pause, expected);
        assert_eq!(log.product_requests().len(), asins.len());
    }
}

#[tokio::test]
async fn test_unwritable_history_is_not_counted_as_recorded() {
    let mut harness = Harness::new();
    harness.config.history_path = harness.dir.path().to_path_buf();
    harness
        .registry
        .add_product(TrackedProduct::new("B0SKILLET", "Skillet"))
        .expect("add");
    let connector = ScriptedConnector::new(Vec::new()).route("B0SKILLET", vec![success()]);
    let resources = harness.resources(connector);

    let report = run_cycle_with(&harness.config, resources, &CancellationToken::new())
        .await
        .expect("cycle");

    assert_eq!(report.recorded, 0);
    assert_eq!(report.history_failures, 1);
    assert_eq!(report.skipped, 0);
    let skillet = harness
        .registry
        .get_product("B0SKILLET")
        .expect("get")
        .expect("tracked");
    assert_eq!(skillet.last_checked, None);
}
