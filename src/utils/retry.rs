//! Retriability of alert delivery errors.

use crate::config::HTTP_STATUS_TOO_MANY_REQUESTS;
use crate::error_handling::AlertError;

/// Determines if an alert delivery error is worth retrying.
///
/// # Retriable
///
/// - Timeouts and connection failures
/// - Server errors (5xx)
/// - Rate limiting (429 Too Many Requests)
/// - SMTP transient replies (4xx) and timeouts
///
/// # Not retriable
///
/// - Other client errors (4xx): bad webhook URL, revoked token, invalid chat
/// - Missing credentials and invalid email addresses
/// - Request building, redirect and decode errors
/// - SMTP permanent replies (5xx) and messages that fail to build
pub(crate) fn is_retriable_error(error: &AlertError) -> bool {
    match error {
        AlertError::Http(e) => {
            if let Some(status) = e.status() {
                return is_retriable_status(status.as_u16());
            }
            e.is_timeout() || e.is_connect() || (e.is_request() && !e.is_builder())
        }
        AlertError::Rejected { status, .. } => is_retriable_status(*status),
        AlertError::Smtp(e) => e.is_transient() || e.is_timeout(),
        AlertError::MissingCredential { .. }
        | AlertError::Message(_)
        | AlertError::Address(_) => false,
    }
}

fn is_retriable_status(status: u16) -> bool {
    status == HTTP_STATUS_TOO_MANY_REQUESTS || (500..600).contains(&status)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected(status: u16) -> AlertError {
        AlertError::Rejected {
            channel: "slack",
            status,
        }
    }

    #[test]
    fn test_rate_limited_is_retriable() {
        assert!(is_retriable_error(&rejected(429)));
    }

    #[test]
    fn test_server_errors_are_retriable() {
        assert!(is_retriable_error(&rejected(500)));
        assert!(is_retriable_error(&rejected(503)));
    }

    #[test]
    fn test_client_errors_are_not_retriable() {
        assert!(!is_retriable_error(&rejected(400)));
        assert!(!is_retriable_error(&rejected(401)));
        assert!(!is_retriable_error(&rejected(404)));
    }

    #[test]
    fn test_missing_credential_is_not_retriable() {
        let err = AlertError::MissingCredential {
            channel: "telegram",
            variable: "TELEGRAM_BOT_TOKEN",
        };
        assert!(!is_retriable_error(&err));
    }

    #[test]
    fn test_invalid_address_is_not_retriable() {
        let err = "not an address"
            .parse::<lettre::message::Mailbox>()
            .expect_err("no @ in address");
        assert!(!is_retriable_error(&AlertError::Address(err)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_retriable() {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(2))
            .build()
            .expect("client builds");
        let err = client
            .post("http://127.0.0.1:9/webhook")
            .send()
            .await
            .expect_err("nothing listens on port 9");
        assert!(is_retriable_error(&AlertError::Http(err)));
    }
}
