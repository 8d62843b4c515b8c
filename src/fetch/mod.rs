//! Resilient product-page fetching.
//!
//! One call to [`Fetcher::fetch`] runs a small state machine:
//!
//! ```text
//! Idle -> Warming -> Attempting(1) -> ... -> Attempting(N) -> Succeeded | Failed
//! ```
//!
//! - **Warming**: a fresh session (own cookie store, one client identity for
//!   the whole invocation) visits the warm-up pages once.
//! - **Attempting(n)**: a random pre-request pause, then a GET with a freshly
//!   drawn header profile of the session's client identity. The response is
//!   classified as success, blocked, malformed or transport error.
//! - Any failure other than on the last attempt is followed by a linear
//!   backoff pause that strictly grows with the attempt number.
//!
//! Every pause and every network call is a cancellation point. Cancellation
//! returns `None` without further requests.

mod backoff;
mod classify;
mod pacer;
mod session;
mod transport;
mod warmup;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio_util::sync::CancellationToken;

use crate::config::FetchConfig;
use crate::error_handling::{ConfigError, FailureKind, InfoType, ProcessingStats};
use crate::profile::ProfileRotator;

pub use backoff::LinearBackoff;
pub use classify::{find_block_signature, FetchResult, ResponseClassifier};
pub use pacer::{pause_unless_cancelled, sample_between, Pacer, PauseReason, TokioPacer};
pub use session::{CookieJar, Session};
pub use transport::{Connector, FetchedPage, HttpConnector, HttpTransport, PageRequest, Transport};
pub use warmup::SessionWarmer;

/// States of one fetch invocation, logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    /// Not started
    Idle,
    /// Opening the session and visiting warm-up pages
    Warming,
    /// Attempt number, 1-based
    Attempting(u32),
    /// Product page received
    Succeeded,
    /// Attempts exhausted
    Failed,
}

impl fmt::Display for FetchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchState::Idle => f.write_str("idle"),
            FetchState::Warming => f.write_str("warming"),
            FetchState::Attempting(n) => write!(f, "attempt {n}"),
            FetchState::Succeeded => f.write_str("succeeded"),
            FetchState::Failed => f.write_str("failed"),
        }
    }
}

/// Detailed outcome of one fetch invocation.
#[derive(Debug, Clone, Default)]
pub struct FetchReport {
    /// Target identifier as given by the caller
    pub target_id: String,
    /// Canonical product URL
    pub url: String,
    /// Body of the successful response, if any
    pub body: Option<String>,
    /// Number of attempts started
    pub attempts: u32,
    /// Backoff pauses requested, in order
    pub backoff_delays: Vec<Duration>,
    /// Reason class of the last failed attempt
    pub last_failure: Option<FailureKind>,
    /// Whether the invocation stopped because of cancellation
    pub cancelled: bool,
    /// Cookies collected by the warm-up
    pub warmup_cookies: usize,
}

impl FetchReport {
    fn new(target_id: &str, url: String) -> Self {
        Self {
            target_id: target_id.to_string(),
            url,
            ..Default::default()
        }
    }
}

/// Fetches product pages with session warm-up, profile rotation and retries.
///
/// A `Fetcher` is shareable across tasks; every invocation builds its own
/// session, so concurrent fetches never share cookies.
pub struct Fetcher {
    config: FetchConfig,
    rotator: Arc<ProfileRotator>,
    connector: Arc<dyn Connector>,
    pacer: Arc<dyn Pacer>,
    warmer: SessionWarmer,
    classifier: ResponseClassifier,
    backoff: LinearBackoff,
    stats: Option<Arc<ProcessingStats>>,
    invocations: AtomicU64,
}

impl Fetcher {
    /// Creates a fetcher from explicit collaborators.
    ///
    /// # Arguments
    ///
    /// * `config` - Fetch tuning (template, warm-up URLs, retries, pacing)
    /// * `rotator` - Header profile pool
    /// * `connector` - Opens one transport per invocation
    /// * `pacer` - Performs every pause
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if `config` fails validation.
    pub fn new(
        config: FetchConfig,
        rotator: Arc<ProfileRotator>,
        connector: Arc<dyn Connector>,
        pacer: Arc<dyn Pacer>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let warmer = SessionWarmer::new(config.warmup_urls.clone(), config.warmup_dwell);
        let classifier =
            ResponseClassifier::new(config.block_signatures.clone(), config.content_markers.clone());
        let backoff = LinearBackoff::new(config.backoff_base, config.backoff_jitter);
        Ok(Self {
            config,
            rotator,
            connector,
            pacer,
            warmer,
            classifier,
            backoff,
            stats: None,
            invocations: AtomicU64::new(0),
        })
    }

    /// Creates a fetcher backed by `reqwest`, the default profile pool and
    /// the tokio timer.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if `config` fails validation.
    pub fn with_http(config: FetchConfig) -> Result<Self, ConfigError> {
        Self::new(
            config,
            Arc::new(ProfileRotator::default()),
            Arc::new(HttpConnector),
            Arc::new(TokioPacer),
        )
    }

    /// Records info events (warm-up failures, synthetic cookies, recoveries).
    pub fn with_stats(mut self, stats: Arc<ProcessingStats>) -> Self {
        self.warmer = self.warmer.with_stats(Arc::clone(&stats));
        self.stats = Some(stats);
        self
    }

    /// Settings this fetcher was built with.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetches the product page for `target_id`.
    ///
    /// # Returns
    ///
    /// The body of a response that carries product markers and no block
    /// signature, or `None` once all attempts failed or `cancel` fired.
    pub async fn fetch(&self, target_id: &str, cancel: &CancellationToken) -> Option<String> {
        self.fetch_report(target_id, cancel).await.body
    }

    /// Same as [`fetch`](Self::fetch) but returns the full attempt history.
    pub async fn fetch_report(&self, target_id: &str, cancel: &CancellationToken) -> FetchReport {
        let url = self.config.product_url(target_id);
        let mut report = FetchReport::new(target_id, url.clone());
        let mut state = FetchState::Idle;
        let mut rng = self.session_rng();

        if cancel.is_cancelled() {
            report.cancelled = true;
            return report;
        }

        transition(&mut state, FetchState::Warming, target_id);
        let identity = self.rotator.next_identity(&mut rng);
        let transport = match self
            .connector
            .connect(&identity, self.config.request_timeout)
        {
            Ok(transport) => transport,
            Err(e) => {
                log::error!("Could not open HTTP session for {target_id}: {e}");
                report.last_failure = Some(FailureKind::TransportError);
                transition(&mut state, FetchState::Failed, target_id);
                return report;
            }
        };

        let jar = self
            .warmer
            .warm(
                transport.as_ref(),
                &identity,
                &self.rotator,
                self.pacer.as_ref(),
                &mut rng,
                cancel,
            )
            .await;
        report.warmup_cookies = jar.len();
        let mut session = Session::new(identity, jar, transport);

        let max_attempts = self.config.retry_count;
        for attempt in 1..=max_attempts {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            transition(&mut state, FetchState::Attempting(attempt), target_id);
            report.attempts = attempt;

            let profile = self.rotator.next_profile_for(&session.identity, &mut rng).clone();
            let (cookies, synthesized) = session.cookies.with_synthetic_defaults(&mut rng);
            if synthesized && attempt == 1 {
                log::debug!("No session cookies from warm-up, using synthetic ones");
                self.record_info(InfoType::SyntheticCookies);
            }

            let jitter = sample_between(&mut rng, self.config.request_jitter);
            if !pause_unless_cancelled(
                self.pacer.as_ref(),
                jitter,
                PauseReason::RequestJitter,
                cancel,
            )
            .await
            {
                report.cancelled = true;
                break;
            }

            let request = PageRequest {
                url: url.clone(),
                profile,
                cookies,
                referer: Some(self.config.referer.clone()),
            };
            let response = tokio::select! {
                response = session.transport.get(&request) => Some(response),
                _ = cancel.cancelled() => None,
            };
            let Some(response) = response else {
                report.cancelled = true;
                break;
            };

            let result = match response {
                Ok(page) => self.classifier.classify(page),
                Err(e) => {
                    log::warn!("Attempt {attempt}/{max_attempts} for {target_id} failed: {e}");
                    FetchResult::TransportError(e)
                }
            };
            session.absorb_cookies(&url);

            if let FetchResult::Success(body) = result {
                if attempt > 1 {
                    log::info!("Fetched {target_id} after {attempt} attempts");
                    self.record_info(InfoType::RecoveredAfterRetry);
                }
                transition(&mut state, FetchState::Succeeded, target_id);
                report.body = Some(body);
                report.last_failure = None;
                return report;
            }

            match &result {
                FetchResult::Blocked(signature) => {
                    log::debug!("{target_id} attempt {attempt} blocked by '{signature}'")
                }
                FetchResult::Malformed(reason) => {
                    log::debug!("{target_id} attempt {attempt} malformed: {reason}")
                }
                _ => {}
            }
            report.last_failure = result.failure_kind();
            if attempt < max_attempts {
                let delay = self.backoff.delay(attempt, &mut rng);
                log::info!(
                    "Attempt {}/{} for {} was {}, retrying in {:.1}s",
                    attempt,
                    max_attempts,
                    target_id,
                    report
                        .last_failure
                        .map(|k| k.as_str())
                        .unwrap_or("unsuccessful"),
                    delay.as_secs_f64()
                );
                report.backoff_delays.push(delay);
                if !pause_unless_cancelled(
                    self.pacer.as_ref(),
                    delay,
                    PauseReason::Backoff { attempt },
                    cancel,
                )
                .await
                {
                    report.cancelled = true;
                    break;
                }
            }
        }

        if report.cancelled {
            log::info!("Fetch of {target_id} cancelled after {} attempts", report.attempts);
        } else {
            log::warn!(
                "Giving up on {} after {} attempts (last: {})",
                target_id,
                report.attempts,
                report
                    .last_failure
                    .map(|k| k.as_str())
                    .unwrap_or("none")
            );
        }
        transition(&mut state, FetchState::Failed, target_id);
        report
    }

    /// Random source for one invocation.
    ///
    /// With a configured seed each invocation gets `seed + n`, so runs are
    /// reproducible while successive invocations still differ.
    fn session_rng(&self) -> StdRng {
        let n = self.invocations.fetch_add(1, Ordering::Relaxed);
        match self.config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(n)),
            None => StdRng::from_os_rng(),
        }
    }

    fn record_info(&self, info: InfoType) {
        if let Some(stats) = &self.stats {
            stats.increment_info(info);
        }
    }
}

fn transition(state: &mut FetchState, next: FetchState, target_id: &str) {
    log::debug!("[{target_id}] {state} -> {next}");
    *state = next;
}
