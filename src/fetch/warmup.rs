//! Session warm-up: visit a few ordinary pages before the product request.
//!
//! A real visitor lands on the home page and browses a category before
//! opening a product, collecting session cookies on the way. Warm-up failure
//! is never fatal: the caller proceeds with an empty jar.

use std::sync::Arc;

use rand::Rng;
use tokio_util::sync::CancellationToken;

use crate::error_handling::{InfoType, ProcessingStats};
use crate::fetch::pacer::{pause_unless_cancelled, sample_between, Pacer, PauseReason};
use crate::fetch::session::CookieJar;
use crate::fetch::transport::{PageRequest, Transport};
use crate::profile::{ClientIdentity, ProfileRotator};

/// Visits the warm-up URLs in order on one transport.
#[derive(Clone)]
pub struct SessionWarmer {
    urls: Vec<String>,
    dwell: (std::time::Duration, std::time::Duration),
    stats: Option<Arc<ProcessingStats>>,
}

impl SessionWarmer {
    /// Creates a warmer over `urls` with a random `dwell` between steps.
    pub fn new(urls: Vec<String>, dwell: (std::time::Duration, std::time::Duration)) -> Self {
        Self {
            urls,
            dwell,
            stats: None,
        }
    }

    /// Records warm-up failures in `stats`.
    pub fn with_stats(mut self, stats: Arc<ProcessingStats>) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Performs the warm-up and returns the cookies it collected.
    ///
    /// Each step uses a header profile of the session's client identity and
    /// sends the previous step's URL as referer. A random dwell separates
    /// steps.
    ///
    /// # Returns
    ///
    /// The cookies set during the warm-up, or an empty jar if any step fails
    /// or `cancel` fires. Failures are logged, never propagated.
    pub async fn warm<R: Rng + Send + ?Sized>(
        &self,
        transport: &dyn Transport,
        identity: &ClientIdentity,
        rotator: &ProfileRotator,
        pacer: &dyn Pacer,
        rng: &mut R,
        cancel: &CancellationToken,
    ) -> CookieJar {
        let mut previous: Option<&str> = None;

        for (step, url) in self.urls.iter().enumerate() {
            if step > 0 {
                let dwell = sample_between(rng, self.dwell);
                if !pause_unless_cancelled(pacer, dwell, PauseReason::WarmupDwell, cancel).await {
                    log::debug!("Warm-up cancelled before visiting {url}");
                    return CookieJar::default();
                }
            }
            if cancel.is_cancelled() {
                return CookieJar::default();
            }

            let request = PageRequest {
                url: url.clone(),
                profile: rotator.next_profile_for(identity, rng).clone(),
                cookies: CookieJar::default(),
                referer: previous.map(str::to_string),
            };

            let result = tokio::select! {
                result = transport.get(&request) => Some(result),
                _ = cancel.cancelled() => None,
            };
            match result {
                None => {
                    log::debug!("Warm-up cancelled while visiting {url}");
                    return CookieJar::default();
                }
                Some(Err(e)) => {
                    log::warn!("Warm-up step {} ({}) failed: {}", step + 1, url, e);
                    if let Some(stats) = &self.stats {
                        stats.increment_info(InfoType::WarmupFailed);
                    }
                    return CookieJar::default();
                }
                Some(Ok(page)) => {
                    log::debug!("Warm-up step {} visited {} (status {})", step + 1, url, page.status);
                }
            }
            previous = Some(url.as_str());
        }

        let mut jar = CookieJar::default();
        for url in &self.urls {
            jar.merge(&transport.cookies(url));
        }
        log::debug!("Warm-up collected {} cookies", jar.len());
        jar
    }
}
