pub mod connection;
pub mod consume;
pub mod watcher;

use std::sync::Arc;

use tokio::sync::watch;
use tunnel_core::{
    CancellationToken, DeliveryQueue, Latch, Observer, SourceConfig, SourceEvent, SourceState,
    TeardownLatch,
};

use connection::ConnectionSlots;

/// State shared between a `TcpSource`, its consume loop, and its watcher task.
pub struct SourceInner {
    pub endpoint: String,
    pub cfg: SourceConfig,
    pub observer: Arc<dyn Observer>,
    pub queue: DeliveryQueue,
    pub conn: ConnectionSlots,
    pub state: watch::Sender<SourceState>,
    /// Fires when the connection is torn down; interrupts pending reads and writes.
    pub interrupt: CancellationToken,
    pub teardown: TeardownLatch,
}

impl SourceInner {
    pub fn new(endpoint: String, cfg: SourceConfig, observer: Arc<dyn Observer>) -> Self {
        let (state, _) = watch::channel(SourceState::Disconnected);
        Self {
            endpoint,
            cfg,
            observer,
            queue: DeliveryQueue::new(),
            conn: ConnectionSlots::default(),
            state,
            interrupt: CancellationToken::new(),
            teardown: TeardownLatch::new(),
        }
    }

    pub fn observe(&self, event: &SourceEvent) {
        self.observer.observe(&self.endpoint, event);
    }

    pub fn state(&self) -> SourceState {
        *self.state.borrow()
    }

    /// Move the state from `from` to `to`. Returns false if the state was not `from`.
    pub fn transition(&self, from: SourceState, to: SourceState) -> bool {
        self.state.send_if_modified(|s| {
            if *s == from {
                *s = to;
                true
            } else {
                false
            }
        })
    }

    /// Tear the connection down and close the delivery queue. Only the first call acts.
    pub async fn close(&self) {
        if !self.teardown.try_fire() {
            self.observe(&SourceEvent::CloseIgnored);
            return;
        }
        self.observe(&SourceEvent::CloseStarted);

        self.interrupt.cancel();
        if let Err(err) = self.conn.shutdown().await {
            self.observe(&SourceEvent::CloseFailed {
                error: err.to_string(),
            });
        }

        self.state.send_replace(SourceState::Closed);
        self.queue.close();
        self.observe(&SourceEvent::Closed);
    }
}

impl Drop for SourceInner {
    fn drop(&mut self) {
        // Releases a watcher whose scope never ends.
        self.interrupt.cancel();
    }
}
