use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::queue::DeliveryReader;
use crate::TunnelError;

/// Capability set every tunnel transport exposes.
///
/// Lifecycle contract:
/// - `connect` establishes the connection and arranges for `close` to run once the given
///   scope is cancelled. An already-cancelled scope makes `connect` a successful no-op.
/// - `consume` runs for the connection's lifetime, handing each inbound chunk to the
///   delivery queue and waiting until a reader has taken it.
/// - `write` forwards bytes to the remote end without buffering.
/// - `close` tears the connection down and closes the delivery queue; only the first call
///   has any effect.
///
/// Readers obtained from `reader` observe end-of-stream (`recv` returns `None`) once the
/// delivery queue is closed.
#[async_trait]
pub trait Source: Send + Sync {
    /// Identifier of the remote endpoint, fixed at construction.
    fn endpoint(&self) -> &str;

    /// Handle to the consuming side of the delivery queue.
    fn reader(&self) -> DeliveryReader;

    /// Establish the connection and start watching `scope` for teardown.
    async fn connect(&self, scope: &CancellationToken) -> Result<(), TunnelError>;

    /// Forward inbound data to the delivery queue until the connection ends.
    ///
    /// Only valid after a successful `connect`.
    async fn consume(&self, scope: &CancellationToken) -> Result<(), TunnelError>;

    /// Write `msg` to the connection.
    async fn write(&self, msg: &[u8]) -> Result<(), TunnelError>;

    /// Tear down the connection and close the delivery queue.
    async fn close(&self);
}
