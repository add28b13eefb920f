//! Tunnel forwards a remote byte stream to a local consumer.
//!
//! Overview
//! - `TcpSource` dials one endpoint, reads from it for the connection's lifetime, and
//!   hands every chunk to a delivery queue that readers drain.
//! - Teardown is tied to a `CancellationToken`: when the scope passed to `connect` ends, a
//!   watcher task closes the connection and the delivery queue exactly once.
//! - Logging goes through an injected `Observer`; by default a `tracing`-backed one.
//!
//! Key behaviors and trade-offs
//! - Backpressure: the delivery queue is unbuffered, so the reader waits for a consumer on
//!   every chunk. A slow consumer slows the network read rate instead of growing memory.
//! - Cancellation: the read loop never polls the scope. Teardown interrupts the pending
//!   read, and `consume` returns a read error for which
//!   `TunnelError::is_connection_closed` is true.
//! - Transient read failures: retried in place. The default retries immediately and
//!   without limit; `TransientRetryPolicy` can bound the retries or add backoff.
//! - Connect with an already-ended scope succeeds without dialing.
//!
//! Examples
//! ```rust,ignore
//! use tunnel::{CancellationToken, Source, TcpSource};
//!
//! let source = TcpSource::builder("127.0.0.1:5900")
//!     .connect_timeout(std::time::Duration::from_secs(3))
//!     .build()?;
//! let scope = CancellationToken::new();
//! source.connect(&scope).await?;
//!
//! let reader = source.reader();
//! let consume = tokio::spawn({
//!     let source = source.clone();
//!     let scope = scope.clone();
//!     async move { source.consume(&scope).await }
//! });
//!
//! while let Some(chunk) = reader.recv().await {
//!     // forward chunk
//! #   break;
//! }
//! scope.cancel();
//! let _ = consume.await;
//! ```
#![warn(missing_docs)]

pub(crate) mod core;
mod tcp;

pub use self::core::{TcpSource, TcpSourceBuilder};

// Re-export core types for convenience
pub use tunnel_core::{
    BackoffConfig, CancellationToken, Chunk, DeliveryQueue, DeliveryReader, NoopObserver,
    Observer, Source, SourceConfig, SourceEvent, SourceState, TransientRetryPolicy, TunnelError,
};
#[cfg(feature = "tracing")]
pub use tunnel_core::TracingObserver;
