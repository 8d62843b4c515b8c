//! Pacing: every deliberate delay in the pipeline goes through a [`Pacer`].
//!
//! Delays are part of the rate-limiting discipline, so they are injectable:
//! production sleeps on the tokio timer, tests record the requested pauses.
//! Every pause is a cancellation point.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio_util::sync::CancellationToken;

/// Why a pause is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseReason {
    /// Human-like dwell between two warm-up pages.
    WarmupDwell,
    /// Jitter before every product request.
    RequestJitter,
    /// Backoff after a failed attempt (1-based attempt number).
    Backoff { attempt: u32 },
    /// Spacing between two products of a cycle.
    ProductSpacing,
}

/// Performs pauses.
#[async_trait]
pub trait Pacer: Send + Sync {
    /// Waits `duration`; `reason` labels the pause for logs and tests.
    async fn pause(&self, duration: Duration, reason: PauseReason);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, duration: Duration, reason: PauseReason) {
        log::trace!("Pausing {:?} ({:?})", duration, reason);
        tokio::time::sleep(duration).await;
    }
}

/// Pauses unless `cancel` fires first.
///
/// Returns `false` when the token was already cancelled or got cancelled
/// during the pause.
pub async fn pause_unless_cancelled(
    pacer: &dyn Pacer,
    duration: Duration,
    reason: PauseReason,
    cancel: &CancellationToken,
) -> bool {
    if cancel.is_cancelled() {
        return false;
    }
    tokio::select! {
        _ = pacer.pause(duration, reason) => true,
        _ = cancel.cancelled() => false,
    }
}

/// Uniform draw in `[min, max]` at millisecond granularity.
pub fn sample_between<R: Rng + ?Sized>(rng: &mut R, range: (Duration, Duration)) -> Duration {
    let (min, max) = range;
    if max <= min {
        return min;
    }
    let millis = rng.random_range(min.as_millis() as u64..=max.as_millis() as u64);
    Duration::from_millis(millis)
}
