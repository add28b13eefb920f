use std::io;
use std::time::Duration;

use rand::Rng;

use crate::TransientRetryPolicy;

/// Returns true if a read failure should be retried in place rather than surfaced.
#[must_use]
pub fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}

/// Add up to `jitter_percent` of random jitter to `base_ms`.
pub fn jitter_wait(base_ms: u64, jitter_percent: u32) -> u64 {
    if base_ms == 0 || jitter_percent == 0 {
        return base_ms;
    }
    let jitter_range = std::cmp::max(1, base_ms.saturating_mul(u64::from(jitter_percent)) / 100);
    let mut rng = rand::rng();
    base_ms + rng.random_range(0..jitter_range)
}

/// Outcome of recording a transient failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the given delay (zero for immediately).
    Retry(Duration),
    /// The policy's bound was exceeded after this many consecutive failures.
    GiveUp {
        /// Consecutive transient failures observed.
        attempts: u32,
    },
}

/// Consecutive transient failure tracker for one consume loop.
#[derive(Debug, Clone)]
pub struct TransientRetry {
    policy: TransientRetryPolicy,
    consecutive: u32,
}

impl TransientRetry {
    /// Start tracking under `policy`.
    #[must_use]
    pub const fn new(policy: TransientRetryPolicy) -> Self {
        Self {
            policy,
            consecutive: 0,
        }
    }

    /// Consecutive transient failures since the last successful read.
    #[must_use]
    pub const fn consecutive(&self) -> u32 {
        self.consecutive
    }

    /// Record a successful read.
    pub const fn reset(&mut self) {
        self.consecutive = 0;
    }

    /// Record a transient failure and decide whether to retry.
    pub fn on_transient(&mut self) -> RetryDecision {
        self.consecutive = self.consecutive.saturating_add(1);
        if !self.policy.allows(self.consecutive) {
            return RetryDecision::GiveUp {
                attempts: self.consecutive,
            };
        }
        let delay = self.policy.backoff.map_or(Duration::ZERO, |b| {
            Duration::from_millis(jitter_wait(
                b.base_delay_ms(self.consecutive),
                u32::from(b.jitter_percent),
            ))
        });
        RetryDecision::Retry(delay)
    }
}
