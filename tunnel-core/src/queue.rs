use std::sync::Arc;

use futures::Stream;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::teardown::{TeardownLatch, teardown_once};

/// One inbound read, trimmed to the bytes actually received.
pub type Chunk = Vec<u8>;

/// Error returned by [`DeliveryQueue::send`] when the queue closed before a reader took
/// the chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueClosed;

struct Handoff {
    chunk: Chunk,
    taken: oneshot::Sender<()>,
}

/// Unbuffered handoff of chunks from one producer to any number of readers.
///
/// `send` completes only after a reader has taken the chunk, so a slow reader throttles
/// the producer. Closing the queue wakes every pending `send` and `recv`; afterwards
/// readers see end-of-stream and sends fail. The queue can be closed once.
pub struct DeliveryQueue {
    tx: mpsc::Sender<Handoff>,
    rx: Arc<Mutex<mpsc::Receiver<Handoff>>>,
    closed: CancellationToken,
    latch: TeardownLatch,
}

impl Default for DeliveryQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DeliveryQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryQueue")
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl DeliveryQueue {
    /// Create an open queue.
    #[must_use]
    pub fn new() -> Self {
        // One slot holds the chunk being handed over; the producer still waits for the
        // `taken` acknowledgement before returning.
        let (tx, rx) = mpsc::channel(1);
        Self {
            tx,
            rx: Arc::new(Mutex::new(rx)),
            closed: CancellationToken::new(),
            latch: TeardownLatch::new(),
        }
    }

    /// Consuming handle for this queue. Readers share the queue; each chunk goes to one
    /// of them.
    #[must_use]
    pub fn reader(&self) -> DeliveryReader {
        DeliveryReader {
            rx: Arc::clone(&self.rx),
            closed: self.closed.clone(),
        }
    }

    /// Hand `chunk` to a reader, waiting until one has taken it.
    ///
    /// # Errors
    /// Returns `QueueClosed` if the queue is closed before a reader takes the chunk.
    pub async fn send(&self, chunk: Chunk) -> Result<(), QueueClosed> {
        if self.closed.is_cancelled() {
            return Err(QueueClosed);
        }
        let (taken_tx, taken_rx) = oneshot::channel();
        let handoff = Handoff {
            chunk,
            taken: taken_tx,
        };

        tokio::select! {
            biased;
            () = self.closed.cancelled() => return Err(QueueClosed),
            res = self.tx.send(handoff) => res.map_err(|_| QueueClosed)?,
        }

        tokio::select! {
            biased;
            res = taken_rx => res.map_err(|_| QueueClosed),
            () = self.closed.cancelled() => Err(QueueClosed),
        }
    }

    /// Close the queue. Returns `true` for the call that closed it.
    pub fn close(&self) -> bool {
        teardown_once(&self.latch, || self.closed.cancel())
    }

    /// Returns `true` once the queue has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }
}

/// Consuming side of a [`DeliveryQueue`].
#[derive(Clone)]
pub struct DeliveryReader {
    rx: Arc<Mutex<mpsc::Receiver<Handoff>>>,
    closed: CancellationToken,
}

impl std::fmt::Debug for DeliveryReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryReader")
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl DeliveryReader {
    /// Receive the next chunk, or `None` once the queue is closed.
    pub async fn recv(&self) -> Option<Chunk> {
        if self.closed.is_cancelled() {
            return None;
        }
        let mut rx = tokio::select! {
            biased;
            () = self.closed.cancelled() => return None,
            guard = self.rx.lock() => guard,
        };
        loop {
            let handoff = tokio::select! {
                biased;
                () = self.closed.cancelled() => return None,
                h = rx.recv() => h?,
            };
            // A failed acknowledgement means the producer gave up on this chunk; skip it.
            if handoff.taken.send(()).is_ok() {
                return Some(handoff.chunk);
            }
        }
    }

    /// Wait until the queue is closed.
    pub async fn closed(&self) {
        self.closed.cancelled().await;
    }

    /// Returns `true` once the queue has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Adapt the reader into a stream that ends with the queue.
    pub fn into_stream(self) -> impl Stream<Item = Chunk> + Send + 'static {
        futures::stream::unfold(self, |reader| async move {
            let chunk = reader.recv().await?;
            Some((chunk, reader))
        })
    }
}
