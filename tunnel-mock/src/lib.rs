//! Test doubles for tunnel sources.
//!
//! - [`SourceMock`]: a scriptable stand-in that implements [`Source`] and reproduces the
//!   observable contract every transport must meet (ordering, failure timing, teardown
//!   delay, write recording).
//! - [`RecordingObserver`]: an [`Observer`](tunnel_core::Observer) that keeps every event.
//! - [`conformance`]: drain helpers usable against any source's delivery queue.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tunnel_core::{CancellationToken, DeliveryQueue, DeliveryReader, Source, TunnelError};

pub mod conformance;
mod recording;

pub use recording::RecordingObserver;

/// Endpoint reported when none is configured.
pub const DEFAULT_ENDPOINT: &str = "mock";

/// Message returned when the fixture is scripted to fail before emitting anything.
pub const FAILED_BEFORE: &str = "failed before";
/// Message returned when the fixture is scripted to fail after emitting everything.
pub const FAILED_AFTER: &str = "failed after";

/// Scriptable source for CI-safe tests.
///
/// `consume` emits the configured messages one at a time over the delivery queue, waiting
/// for a reader on each. Then it either fails (if scripted to) or waits for the scope to
/// end, sleeps the configured stop delay, and returns `Ok`.
pub struct SourceMock {
    endpoint: String,
    queue: DeliveryQueue,
    read_msgs: Vec<String>,
    fails_before: bool,
    fails_after: bool,
    stop_delay: Duration,
    consuming: AtomicBool,
    got_msgs: Mutex<Vec<String>>,
}

impl SourceMock {
    /// Create a fixture with every behavior spelled out.
    #[must_use]
    pub fn new(
        read_msgs: Vec<String>,
        fails_before: bool,
        fails_after: bool,
        stop_delay: Duration,
    ) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            queue: DeliveryQueue::new(),
            read_msgs,
            fails_before,
            fails_after,
            stop_delay,
            consuming: AtomicBool::new(false),
            got_msgs: Mutex::new(Vec::new()),
        }
    }

    /// Fixture that emits `read_msgs` and never fails.
    #[must_use]
    pub fn normal<S: Into<String>>(read_msgs: impl IntoIterator<Item = S>) -> Self {
        Self::new(
            read_msgs.into_iter().map(Into::into).collect(),
            false,
            false,
            Duration::ZERO,
        )
    }

    /// Start building a fixture.
    #[must_use]
    pub fn builder() -> SourceMockBuilder {
        SourceMockBuilder::default()
    }

    /// Returns true while the emission loop runs.
    #[must_use]
    pub fn is_consuming(&self) -> bool {
        self.consuming.load(Ordering::Acquire)
    }

    /// Returns true if some write carried exactly `msg`.
    #[must_use]
    pub fn got_message(&self, msg: &str) -> bool {
        self.got_msgs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|m| m == msg)
    }

    /// Snapshot of every write, in call order.
    #[must_use]
    pub fn written(&self) -> Vec<String> {
        self.got_msgs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns true once the delivery queue has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.queue.is_closed()
    }
}

struct ConsumingGuard<'a>(&'a AtomicBool);

impl Drop for ConsumingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[async_trait]
impl Source for SourceMock {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn reader(&self) -> DeliveryReader {
        self.queue.reader()
    }

    async fn connect(&self, _scope: &CancellationToken) -> Result<(), TunnelError> {
        Ok(())
    }

    async fn consume(&self, scope: &CancellationToken) -> Result<(), TunnelError> {
        if self.fails_before {
            return Err(TunnelError::Other(FAILED_BEFORE.to_string()));
        }
        self.consuming.store(true, Ordering::Release);
        let _guard = ConsumingGuard(&self.consuming);

        for msg in &self.read_msgs {
            if self.queue.send(msg.as_bytes().to_vec()).await.is_err() {
                return Err(TunnelError::DeliveryClosed {
                    endpoint: self.endpoint.clone(),
                });
            }
        }
        if self.fails_after {
            return Err(TunnelError::Other(FAILED_AFTER.to_string()));
        }

        scope.cancelled().await;
        tokio::time::sleep(self.stop_delay).await;
        Ok(())
    }

    async fn write(&self, msg: &[u8]) -> Result<(), TunnelError> {
        self.got_msgs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(String::from_utf8_lossy(msg).into_owned());
        Ok(())
    }

    async fn close(&self) {
        self.queue.close();
    }
}

/// Builder for [`SourceMock`].
#[derive(Debug, Default)]
pub struct SourceMockBuilder {
    endpoint: Option<String>,
    read_msgs: Vec<String>,
    fails_before: bool,
    fails_after: bool,
    stop_delay: Duration,
}

impl SourceMockBuilder {
    /// Identifier reported by `endpoint()`. Defaults to [`DEFAULT_ENDPOINT`].
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Messages to emit, in order.
    #[must_use]
    pub fn messages<S: Into<String>>(mut self, msgs: impl IntoIterator<Item = S>) -> Self {
        self.read_msgs = msgs.into_iter().map(Into::into).collect();
        self
    }

    /// Fail `consume` before emitting anything.
    #[must_use]
    pub const fn fail_before(mut self, yes: bool) -> Self {
        self.fails_before = yes;
        self
    }

    /// Fail `consume` after emitting every message.
    #[must_use]
    pub const fn fail_after(mut self, yes: bool) -> Self {
        self.fails_after = yes;
        self
    }

    /// Delay between the scope ending and `consume` returning.
    #[must_use]
    pub const fn stop_delay(mut self, delay: Duration) -> Self {
        self.stop_delay = delay;
        self
    }

    /// Build the fixture.
    #[must_use]
    pub fn build(self) -> SourceMock {
        let mut mock = SourceMock::new(
            self.read_msgs,
            self.fails_before,
            self.fails_after,
            self.stop_delay,
        );
        if let Some(endpoint) = self.endpoint {
            mock.endpoint = endpoint;
        }
        mock
    }
}
