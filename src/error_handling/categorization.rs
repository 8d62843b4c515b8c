//! Error categorization and retry strategy.
//!
//! This module maps `reqwest` errors onto the transport taxonomy used by the
//! fetch loop and configures the retry strategy for alert delivery.

use std::time::Duration;
use tokio_retry::strategy::ExponentialBackoff;

use super::types::TransportError;

/// Creates the exponential backoff strategy used when delivering alerts.
///
/// Returns a retry strategy configured with:
/// - Initial delay: `ALERT_RETRY_INITIAL_DELAY_MS` milliseconds
/// - Backoff factor: `ALERT_RETRY_FACTOR`
/// - Maximum delay: `ALERT_RETRY_MAX_DELAY_SECS` seconds
/// - Maximum retries: `ALERT_RETRY_MAX_ATTEMPTS`
///
/// The product fetch loop does not use this strategy: its pacing is linear
/// and driven by [`LinearBackoff`](crate::fetch::LinearBackoff).
pub fn get_retry_strategy() -> impl Iterator<Item = Duration> {
    ExponentialBackoff::from_millis(crate::config::ALERT_RETRY_INITIAL_DELAY_MS)
        .factor(crate::config::ALERT_RETRY_FACTOR)
        .max_delay(Duration::from_secs(crate::config::ALERT_RETRY_MAX_DELAY_SECS))
        .take(crate::config::ALERT_RETRY_MAX_ATTEMPTS)
}

/// Categorizes a `reqwest::Error` into a `TransportError`.
///
/// Status errors never reach this function: the fetch loop inspects the body
/// of every response, whatever its status code.
pub fn categorize_reqwest_error(error: &reqwest::Error) -> TransportError {
    let message = error.to_string();
    if error.is_timeout() {
        TransportError::Timeout(message)
    } else if error.is_connect() {
        TransportError::Connect(message)
    } else if error.is_body() || error.is_decode() {
        TransportError::Body(message)
    } else if error.is_builder() {
        TransportError::Builder(message)
    } else {
        TransportError::Other(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_retry_strategy_max_attempts() {
        let count = get_retry_strategy().count();
        assert_eq!(count, crate::config::ALERT_RETRY_MAX_ATTEMPTS);
    }

    #[test]
    fn test_get_retry_strategy_max_delay() {
        let max_delay_ms = crate::config::ALERT_RETRY_MAX_DELAY_SECS * 1000;
        for delay in get_retry_strategy() {
            assert!(
                delay.as_millis() <= max_delay_ms as u128,
                "Delay {}ms exceeds max {}ms",
                delay.as_millis(),
                max_delay_ms
            );
        }
    }

    #[test]
    fn test_get_retry_strategy_non_decreasing() {
        let delays: Vec<Duration> = get_retry_strategy().collect();
        for pair in delays.windows(2) {
            assert!(pair[1] >= pair[0], "{:?} should not shrink", pair);
        }
    }

    #[tokio::test]
    async fn test_categorize_builder_error() {
        let client = reqwest::Client::new();
        let err = client
            .get("not a url")
            .send()
            .await
            .expect_err("relative URL must fail");
        assert!(matches!(
            categorize_reqwest_error(&err),
            TransportError::Builder(_)
        ));
    }

    #[tokio::test]
    async fn test_categorize_connect_error() {
        // Port 9 on localhost is the discard service and is almost never listening.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .expect("client");
        let err = client
            .get("http://127.0.0.1:9/")
            .send()
            .await
            .expect_err("nothing listens on port 9");
        assert!(matches!(
            categorize_reqwest_error(&err),
            TransportError::Connect(_) | TransportError::Other(_)
        ));
    }
}
