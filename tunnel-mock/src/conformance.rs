//! Helpers for checking what a source delivers, independent of the transport behind it.
use std::time::Duration;

use tunnel_core::{Chunk, DeliveryReader};

/// Result of waiting on a reader for a bounded time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Next {
    /// A chunk arrived.
    Chunk(Chunk),
    /// The queue closed.
    End,
    /// Nothing happened within the window.
    Pending,
}

/// Wait up to `window` for the next event on `reader`.
pub async fn next_within(reader: &DeliveryReader, window: Duration) -> Next {
    match tokio::time::timeout(window, reader.recv()).await {
        Ok(Some(chunk)) => Next::Chunk(chunk),
        Ok(None) => Next::End,
        Err(_) => Next::Pending,
    }
}

/// Receive exactly `n` chunks, allowing `per_chunk` for each.
///
/// Returns `None` if the queue ended or stalled first.
pub async fn drain_exact(
    reader: &DeliveryReader,
    n: usize,
    per_chunk: Duration,
) -> Option<Vec<Chunk>> {
    let mut out = Vec::with_capacity(n);
    while out.len() < n {
        match next_within(reader, per_chunk).await {
            Next::Chunk(chunk) => out.push(chunk),
            Next::End | Next::Pending => return None,
        }
    }
    Some(out)
}

/// Receive chunks until the queue closes, allowing `per_chunk` between events.
///
/// Returns `None` if the reader stalled before end-of-stream.
pub async fn drain_to_end(reader: &DeliveryReader, per_chunk: Duration) -> Option<Vec<Chunk>> {
    let mut out = Vec::new();
    loop {
        match next_within(reader, per_chunk).await {
            Next::Chunk(chunk) => out.push(chunk),
            Next::End => return Some(out),
            Next::Pending => return None,
        }
    }
}

/// Returns true if neither a chunk nor end-of-stream arrives within `window`.
pub async fn stays_pending(reader: &DeliveryReader, window: Duration) -> bool {
    next_within(reader, window).await == Next::Pending
}

/// Concatenate chunks into one byte string, for transports that do not keep chunk
/// boundaries.
#[must_use]
pub fn concat(chunks: &[Chunk]) -> Vec<u8> {
    chunks.iter().flatten().copied().collect()
}
