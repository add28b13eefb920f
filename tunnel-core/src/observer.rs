use std::sync::Arc;
use std::time::Duration;

/// Lifecycle and error events emitted by a source.
///
/// Observers receive these for logging and diagnostics only; nothing an observer does
/// feeds back into the source's control flow.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SourceEvent {
    /// `connect` was called with a scope that had already ended; nothing was dialed.
    ConnectSkipped,
    /// Dial started.
    Connecting {
        /// Upper bound on the dial.
        timeout: Duration,
    },
    /// Dial succeeded and the watcher task is running.
    Connected,
    /// Dial failed.
    ConnectFailed {
        /// Rendered dial failure.
        error: String,
    },
    /// The consume loop started reading.
    ConsumeStarted,
    /// The consume loop returned.
    ConsumeEnded {
        /// Rendered failure that ended the loop, if any.
        error: Option<String>,
    },
    /// A transient read failure was swallowed and the read will be retried.
    TransientReadError {
        /// Consecutive transient failures so far.
        attempt: u32,
        /// Rendered read failure.
        error: String,
    },
    /// Teardown started.
    CloseStarted,
    /// Closing the connection failed; teardown continued regardless.
    CloseFailed {
        /// Rendered close failure.
        error: String,
    },
    /// Teardown finished; the delivery queue is closed.
    Closed,
    /// `close` was called after teardown had already run.
    CloseIgnored,
}

/// Receives events from a source, tagged with the source's endpoint.
pub trait Observer: Send + Sync {
    /// Record one event.
    fn observe(&self, endpoint: &str, event: &SourceEvent);
}

/// Observer that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl Observer for NoopObserver {
    fn observe(&self, _endpoint: &str, _event: &SourceEvent) {}
}

/// Observer that forwards events to `tracing`.
#[cfg(feature = "tracing")]
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

#[cfg(feature = "tracing")]
impl Observer for TracingObserver {
    fn observe(&self, endpoint: &str, event: &SourceEvent) {
        match event {
            SourceEvent::ConnectSkipped => {
                tracing::debug!(endpoint, "scope already ended, skipping connect");
            }
            SourceEvent::Connecting { timeout } => {
                let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
                tracing::info!(endpoint, timeout_ms, "connecting");
            }
            SourceEvent::Connected => tracing::info!(endpoint, "connected"),
            SourceEvent::ConnectFailed { error } => {
                tracing::error!(endpoint, %error, "dial failed");
            }
            SourceEvent::ConsumeStarted => tracing::debug!(endpoint, "consume started"),
            SourceEvent::ConsumeEnded { error: None } => {
                tracing::debug!(endpoint, "consume ended");
            }
            SourceEvent::ConsumeEnded { error: Some(error) } => {
                tracing::debug!(endpoint, %error, "consume ended");
            }
            SourceEvent::TransientReadError { attempt, error } => {
                tracing::trace!(endpoint, attempt, %error, "transient read error, retrying");
            }
            SourceEvent::CloseStarted => tracing::debug!(endpoint, "close started"),
            SourceEvent::CloseFailed { error } => {
                tracing::error!(endpoint, %error, "could not close connection");
            }
            SourceEvent::Closed => tracing::debug!(endpoint, "closed"),
            SourceEvent::CloseIgnored => {
                tracing::warn!(endpoint, "close called after teardown, ignoring");
            }
        }
    }
}

/// Observer used when none is injected: `TracingObserver` with the `tracing` feature,
/// `NoopObserver` otherwise.
#[must_use]
pub fn default_observer() -> Arc<dyn Observer> {
    #[cfg(feature = "tracing")]
    {
        Arc::new(TracingObserver)
    }
    #[cfg(not(feature = "tracing"))]
    {
        Arc::new(NoopObserver)
    }
}
