// Shared test helpers for driving the fetcher without a network.
//
// A scripted connector hands out transports that answer warm-up URLs with a
// fixed page and product URLs from a queue of canned results. A recording
// pacer stores every requested pause and returns immediately.

#![allow(dead_code)] // Each test file uses a different subset

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use price_tracker::error_handling::TransportError;
use price_tracker::fetch::{
    Connector, CookieJar, FetchedPage, Pacer, PageRequest, PauseReason, Transport,
};
use price_tracker::profile::ClientIdentity;
use price_tracker::FetchConfig;

pub const WARMUP_LANDING: &str = "https://shop.test/";
pub const WARMUP_CATEGORY: &str = "https://shop.test/category/kitchen";

pub const PRODUCT_BODY: &str = r#"<html><body>
<span id="productTitle">Cast Iron Skillet</span>
<div id="corePrice_feature_div"><span class="a-price"><span class="a-offscreen">$34.95</span></span></div>
<div id="availability"><span>In Stock</span></div>
</body></html>"#;

pub const BLOCKED_BODY: &str = r#"<html><body>
<h4>Enter the characters you see below</h4>
<p>Sorry, we just need to make sure you're not a robot.</p>
</body></html>"#;

pub const MALFORMED_BODY: &str = "<html><body><p>Service Unavailable</p></body></html>";

/// Fetch settings pointing at the scripted site, with a fixed seed.
pub fn test_fetch_config() -> FetchConfig {
    FetchConfig {
        url_template: "https://shop.test/dp/{id}".to_string(),
        warmup_urls: vec![WARMUP_LANDING.to_string(), WARMUP_CATEGORY.to_string()],
        referer: WARMUP_LANDING.to_string(),
        rng_seed: Some(42),
        ..Default::default()
    }
}

pub fn page(status: u16, body: &str) -> Result<FetchedPage, TransportError> {
    Ok(FetchedPage {
        status,
        body: body.to_string(),
        final_url: "https://shop.test/dp/B0SKILLET".to_string(),
    })
}

pub fn success() -> Result<FetchedPage, TransportError> {
    page(200, PRODUCT_BODY)
}

pub fn blocked() -> Result<FetchedPage, TransportError> {
    page(200, BLOCKED_BODY)
}

pub fn malformed() -> Result<FetchedPage, TransportError> {
    page(503, MALFORMED_BODY)
}

pub fn timeout() -> Result<FetchedPage, TransportError> {
    Err(TransportError::Timeout("operation timed out".to_string()))
}

/// Everything the scripted transports saw, shared with the test body.
#[derive(Default)]
pub struct ScriptLog {
    pub requests: Mutex<Vec<PageRequest>>,
    pub connects: AtomicUsize,
    pub identities: Mutex<Vec<ClientIdentity>>,
}

impl ScriptLog {
    pub fn urls(&self) -> Vec<String> {
        self.requests
            .lock()
            .expect("request log")
            .iter()
            .map(|r| r.url.clone())
            .collect()
    }

    pub fn count_url(&self, url: &str) -> usize {
        self.urls().iter().filter(|u| u.as_str() == url).count()
    }

    pub fn product_requests(&self) -> Vec<PageRequest> {
        self.requests
            .lock()
            .expect("request log")
            .iter()
            .filter(|r| r.url.contains("/dp/"))
            .cloned()
            .collect()
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

type Script = Arc<Mutex<VecDeque<Result<FetchedPage, TransportError>>>>;
type Routes = Arc<Mutex<HashMap<String, VecDeque<Result<FetchedPage, TransportError>>>>>;

/// Connector whose transports replay a shared script of product responses.
///
/// Product URLs ending in a routed target id are answered from that
/// target's own script; all others from the shared one.
pub struct ScriptedConnector {
    script: Script,
    routes: Routes,
    warmup_cookies: CookieJar,
    warmup_fails: bool,
    pub log: Arc<ScriptLog>,
}

impl ScriptedConnector {
    pub fn new(script: Vec<Result<FetchedPage, TransportError>>) -> Self {
        let mut warmup_cookies = CookieJar::new();
        warmup_cookies.insert("session-id", "131-1111111-2222222");
        warmup_cookies.insert("ubid-main", "133-3333333-4444444");
        Self {
            script: Arc::new(Mutex::new(script.into())),
            routes: Arc::new(Mutex::new(HashMap::new())),
            warmup_cookies,
            warmup_fails: false,
            log: Arc::new(ScriptLog::default()),
        }
    }

    /// Answers product requests for `target_id` from `script`.
    pub fn route(self, target_id: &str, script: Vec<Result<FetchedPage, TransportError>>) -> Self {
        self.routes
            .lock()
            .expect("routes")
            .insert(target_id.to_string(), script.into());
        self
    }

    /// Warm-up pages answer with a connection error.
    pub fn with_failing_warmup(mut self) -> Self {
        self.warmup_fails = true;
        self
    }

    /// Warm-up pages succeed but set no cookies.
    pub fn without_warmup_cookies(mut self) -> Self {
        self.warmup_cookies = CookieJar::new();
        self
    }
}

impl Connector for ScriptedConnector {
    fn connect(
        &self,
        identity: &ClientIdentity,
        _timeout: Duration,
    ) -> Result<Box<dyn Transport>, TransportError> {
        self.log.connects.fetch_add(1, Ordering::SeqCst);
        self.log
            .identities
            .lock()
            .expect("identity log")
            .push(identity.clone());
        Ok(Box::new(ScriptedTransport {
            script: Arc::clone(&self.script),
            routes: Arc::clone(&self.routes),
            warmup_cookies: self.warmup_cookies.clone(),
            warmup_fails: self.warmup_fails,
            warmed: Mutex::new(false),
            log: Arc::clone(&self.log),
        }))
    }
}

struct ScriptedTransport {
    script: Script,
    routes: Routes,
    warmup_cookies: CookieJar,
    warmup_fails: bool,
    warmed: Mutex<bool>,
    log: Arc<ScriptLog>,
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, request: &PageRequest) -> Result<FetchedPage, TransportError> {
        self.log
            .requests
            .lock()
            .expect("request log")
            .push(request.clone());

        if !request.url.contains("/dp/") {
            if self.warmup_fails {
                return Err(TransportError::Connect("connection refused".to_string()));
            }
            *self.warmed.lock().expect("warm flag") = true;
            return Ok(FetchedPage {
                status: 200,
                body: "<html><body>Welcome</body></html>".to_string(),
                final_url: request.url.clone(),
            });
        }

        let routed = self
            .routes
            .lock()
            .expect("routes")
            .iter_mut()
            .find(|(target_id, _)| request.url.ends_with(target_id.as_str()))
            .map(|(_, script)| script.pop_front());
        let next = match routed {
            Some(next) => next,
            None => self.script.lock().expect("script").pop_front(),
        };
        next.unwrap_or_else(|| Err(TransportError::Other("script exhausted".to_string())))
    }

    fn cookies(&self, _url: &str) -> CookieJar {
        if *self.warmed.lock().expect("warm flag") {
            self.warmup_cookies.clone()
        } else {
            CookieJar::new()
        }
    }
}

/// Pacer that records pauses and returns at once.
///
/// Optionally cancels a token when a backoff pause is requested and then
/// never completes, which simulates Ctrl-C arriving mid-backoff.
#[derive(Default)]
pub struct RecordingPacer {
    pauses: Mutex<Vec<(Duration, PauseReason)>>,
    cancel_on_backoff: Option<CancellationToken>,
}

impl RecordingPacer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancelling_on_backoff(cancel: CancellationToken) -> Self {
        Self {
            pauses: Mutex::new(Vec::new()),
            cancel_on_backoff: Some(cancel),
        }
    }

    pub fn pauses(&self) -> Vec<(Duration, PauseReason)> {
        self.pauses.lock().expect("pause log").clone()
    }

    pub fn backoffs(&self) -> Vec<(u32, Duration)> {
        self.pauses()
            .into_iter()
            .filter_map(|(duration, reason)| match reason {
                PauseReason::Backoff { attempt } => Some((attempt, duration)),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, wanted: PauseReason) -> usize {
        self.pauses()
            .iter()
            .filter(|(_, reason)| *reason == wanted)
            .count()
    }
}

#[async_trait]
impl Pacer for RecordingPacer {
    async fn pause(&self, duration: Duration, reason: PauseReason) {
        self.pauses
            .lock()
            .expect("pause log")
            .push((duration, reason));
        if let (Some(cancel), PauseReason::Backoff { .. }) = (&self.cancel_on_backoff, reason) {
            cancel.cancel();
            std::future::pending::<()>().await;
        }
    }
}
