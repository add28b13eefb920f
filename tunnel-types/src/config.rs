//! Configuration types shared by source implementations.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::TunnelError;

/// Exponential backoff applied between retries of a transient read failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Minimum backoff delay in milliseconds.
    pub min_backoff_ms: u64,
    /// Maximum backoff delay in milliseconds.
    pub max_backoff_ms: u64,
    /// Exponential factor to increase delay after each failure (>= 1).
    pub factor: u32,
    /// Random jitter percentage [0, 100] added to each delay.
    pub jitter_percent: u8,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            min_backoff_ms: 1,
            max_backoff_ms: 100,
            factor: 2,
            jitter_percent: 20,
        }
    }
}

impl BackoffConfig {
    /// Base delay (before jitter) for the given 1-based consecutive attempt.
    #[must_use]
    pub fn base_delay_ms(&self, attempt: u32) -> u64 {
        let factor = u64::from(self.factor.max(1));
        let mut delay = self.min_backoff_ms;
        for _ in 1..attempt {
            delay = delay.saturating_mul(factor);
            if delay >= self.max_backoff_ms {
                return self.max_backoff_ms;
            }
        }
        delay.min(self.max_backoff_ms)
    }
}

/// How a consume loop treats transient read failures.
///
/// The default retries immediately and without limit. Setting `max_consecutive` bounds the
/// number of back-to-back transient failures; `backoff` inserts a delay between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransientRetryPolicy {
    /// Give up after this many consecutive transient failures. `None` means unbounded.
    pub max_consecutive: Option<u32>,
    /// Delay between retries. `None` retries immediately.
    pub backoff: Option<BackoffConfig>,
}

impl TransientRetryPolicy {
    /// Retry immediately, forever.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            max_consecutive: None,
            backoff: None,
        }
    }

    /// Retry at most `max` consecutive times.
    #[must_use]
    pub const fn bounded(max: u32) -> Self {
        Self {
            max_consecutive: Some(max),
            backoff: None,
        }
    }

    /// Add a backoff between retries.
    #[must_use]
    pub const fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = Some(backoff);
        self
    }

    /// Returns true if another retry is allowed after `attempts` consecutive failures.
    #[must_use]
    pub fn allows(&self, attempts: u32) -> bool {
        self.max_consecutive.is_none_or(|max| attempts <= max)
    }
}

/// Configuration of a single stream source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Upper bound on the dial.
    pub connect_timeout: Duration,
    /// Maximum number of bytes handed to the delivery queue per read.
    pub read_chunk_size: usize,
    /// Treatment of transient read failures.
    pub transient_retry: TransientRetryPolicy,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(3),
            read_chunk_size: 1024,
            transient_retry: TransientRetryPolicy::unbounded(),
        }
    }
}

impl SourceConfig {
    /// Check the configuration for values no source can run with.
    ///
    /// # Errors
    /// Returns `InvalidArg` for a zero chunk size, a zero connect timeout, or a backoff whose
    /// minimum exceeds its maximum.
    pub fn validate(&self) -> Result<(), TunnelError> {
        if self.read_chunk_size == 0 {
            return Err(TunnelError::InvalidArg(
                "read_chunk_size must be greater than zero".into(),
            ));
        }
        if self.connect_timeout.is_zero() {
            return Err(TunnelError::InvalidArg(
                "connect_timeout must be greater than zero".into(),
            ));
        }
        if let Some(b) = self.transient_retry.backoff
            && b.min_backoff_ms > b.max_backoff_ms
        {
            return Err(TunnelError::InvalidArg(format!(
                "backoff min {}ms exceeds max {}ms",
                b.min_backoff_ms, b.max_backoff_ms
            )));
        }
        Ok(())
    }
}
