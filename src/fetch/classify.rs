//! Response classification.
//!
//! Decides whether a raw response is a usable product page, a challenge page,
//! or something else. The status code is logged but never decides the class
//! on its own: challenge pages are frequently served with `200 OK`.

use crate::error_handling::{FailureKind, TransportError};
use crate::fetch::transport::FetchedPage;

/// Outcome of one fetch attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchResult {
    /// Body contains a content marker and no block signature.
    Success(String),
    /// Body matches the carried challenge-page signature.
    Blocked(String),
    /// Body has neither a block signature nor a content marker; carries the
    /// reason.
    Malformed(String),
    /// No body: the request itself failed.
    TransportError(TransportError),
}

impl FetchResult {
    /// Reason class for a non-success outcome.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            FetchResult::Success(_) => None,
            FetchResult::Blocked(_) => Some(FailureKind::Blocked),
            FetchResult::Malformed(_) => Some(FailureKind::Malformed),
            FetchResult::TransportError(_) => Some(FailureKind::TransportError),
        }
    }

    /// Whether the attempt produced a usable page.
    pub fn is_success(&self) -> bool {
        matches!(self, FetchResult::Success(_))
    }
}

/// Returns the first block signature found in `body`, case-insensitively.
///
/// Signatures must already be lower-case.
pub fn find_block_signature<'a, S: AsRef<str>>(body: &str, signatures: &'a [S]) -> Option<&'a str> {
    let lowered = body.to_lowercase();
    signatures
        .iter()
        .map(AsRef::as_ref)
        .find(|signature| !signature.is_empty() && lowered.contains(signature))
}

/// Classifies fetched pages against block signatures and content markers.
#[derive(Debug, Clone)]
pub struct ResponseClassifier {
    block_signatures: Vec<String>,
    content_markers: Vec<String>,
}

impl ResponseClassifier {
    /// Creates a classifier from lower-case signatures and case-sensitive markers.
    pub fn new(block_signatures: Vec<String>, content_markers: Vec<String>) -> Self {
        Self {
            block_signatures,
            content_markers,
        }
    }

    /// Classifies one page.
    ///
    /// Block signatures are checked first: a challenge page that happens to
    /// echo a content marker is still `Blocked`.
    pub fn classify(&self, page: FetchedPage) -> FetchResult {
        if let Some(signature) = find_block_signature(&page.body, &self.block_signatures) {
            log::warn!(
                "Challenge page detected (status {}, matched '{}')",
                page.status,
                signature
            );
            return FetchResult::Blocked(signature.to_string());
        }

        let has_marker = self
            .content_markers
            .iter()
            .any(|marker| !marker.is_empty() && page.body.contains(marker.as_str()));
        if has_marker {
            log::debug!(
                "Product page received (status {}, {} bytes)",
                page.status,
                page.body.len()
            );
            FetchResult::Success(page.body)
        } else {
            let reason = format!(
                "no product markers (status {}, {} bytes)",
                page.status,
                page.body.len()
            );
            log::warn!("Response with {}", reason);
            FetchResult::Malformed(reason)
        }
    }
}
