//! tunnel-core
//!
//! Contracts and building blocks shared by every tunnel source.
//!
//! - `source`: the `Source` capability trait implemented by transports and test fixtures.
//! - `queue`: the unbuffered delivery queue carrying inbound chunks to a consumer.
//! - `observer`: the injected collaborator that receives lifecycle and error events.
//! - `teardown`: the one-shot latch guarding close paths.
//! - `transient`: classification and retry pacing for transient read failures.
//!
//! Async runtime (Tokio)
//! ---------------------
//! The delivery queue is built on `tokio::sync` primitives and cancellation scopes are
//! `tokio_util::sync::CancellationToken`s, so sources must run under a Tokio 1.x runtime.
#![warn(missing_docs)]

/// Observability collaborator and the lifecycle events it receives.
pub mod observer;
/// Rendezvous delivery queue between a network reader and its consumer.
pub mod queue;
/// The `Source` capability trait.
pub mod source;
/// One-shot teardown latch.
pub mod teardown;
/// Transient read error classification and retry pacing.
pub mod transient;

pub use observer::{NoopObserver, Observer, SourceEvent, default_observer};
#[cfg(feature = "tracing")]
pub use observer::TracingObserver;
pub use queue::{Chunk, DeliveryQueue, DeliveryReader, QueueClosed};
pub use source::Source;
pub use teardown::{Latch, TeardownLatch, teardown_once};
pub use tokio_util::sync::CancellationToken;
pub use transient::{RetryDecision, TransientRetry, is_transient, jitter_wait};
pub use tunnel_types::{
    BackoffConfig, SourceConfig, SourceState, TransientRetryPolicy, TunnelError,
};
