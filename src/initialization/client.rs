//! HTTP client initialization.
//!
//! Two kinds of clients exist: one shared client for alert delivery, and one
//! short-lived client per product fetch, each with its own cookie store.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::ClientBuilder;

use crate::config::{ALERT_REQUEST_TIMEOUT, TCP_CONNECT_TIMEOUT};

/// Maximum redirects followed by a product session.
const MAX_SESSION_REDIRECTS: usize = 10;

/// Initializes the shared client used to deliver alerts.
///
/// Creates a `reqwest::Client` configured with:
/// - `ALERT_REQUEST_TIMEOUT` per request
/// - `TCP_CONNECT_TIMEOUT` for connection establishment
/// - A descriptive user agent (webhook endpoints are not scraped sites)
///
/// # Errors
///
/// Returns a `reqwest::Error` if client creation fails.
pub fn init_alert_client() -> Result<Arc<reqwest::Client>, reqwest::Error> {
    let client = ClientBuilder::new()
        .timeout(ALERT_REQUEST_TIMEOUT)
        .connect_timeout(TCP_CONNECT_TIMEOUT)
        .user_agent(concat!("price_tracker/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(Arc::new(client))
}

/// Builds the client of one fetch session together with its cookie store.
///
/// No default headers are set: every request carries the full header set of
/// the profile drawn for it. Cookies set by responses land in the returned
/// jar, which the session reads back after the warm-up.
///
/// # Arguments
///
/// * `timeout` - Per-request timeout
///
/// # Errors
///
/// Returns a `reqwest::Error` if client creation fails.
pub fn build_session_client(timeout: Duration) -> Result<(reqwest::Client, Arc<Jar>), reqwest::Error> {
    let jar = Arc::new(Jar::default());
    let client = ClientBuilder::new()
        .cookie_provider(Arc::clone(&jar))
        .timeout(timeout)
        .connect_timeout(TCP_CONNECT_TIMEOUT.min(timeout))
        .redirect(reqwest::redirect::Policy::limited(MAX_SESSION_REDIRECTS))
        .build()?;
    Ok((client, jar))
}
