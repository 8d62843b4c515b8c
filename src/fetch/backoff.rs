//! Linear backoff between fetch attempts.

use std::time::Duration;

use rand::Rng;

/// Pause after attempt `n` is `base * n` plus a random jitter.
///
/// The jitter is drawn from `[0, cap)` where `cap` is the configured jitter
/// clamped strictly below `base`. Hence for any two consecutive attempts the
/// later pause is strictly longer, whatever the draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearBackoff {
    base: Duration,
    jitter: Duration,
}

impl LinearBackoff {
    /// Creates a backoff; `jitter` is clamped below `base`.
    pub fn new(base: Duration, jitter: Duration) -> Self {
        let cap = base.saturating_sub(Duration::from_millis(1));
        Self {
            base,
            jitter: jitter.min(cap),
        }
    }

    /// Pause without jitter for a 1-based attempt number.
    pub fn nominal(&self, attempt: u32) -> Duration {
        self.base.saturating_mul(attempt)
    }

    /// Pause with jitter for a 1-based attempt number.
    pub fn delay<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        let jitter_ms = self.jitter.as_millis() as u64;
        let extra = if jitter_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rng.random_range(0..jitter_ms))
        };
        self.nominal(attempt) + extra
    }

    /// Effective jitter bound after clamping.
    pub fn jitter(&self) -> Duration {
        self.jitter
    }
}
