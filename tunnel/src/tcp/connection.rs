use std::io;
use std::net::SocketAddr;
use std::sync::OnceLock;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::Mutex;
use tunnel_core::CancellationToken;

/// Dial `endpoint`, giving up after `timeout`.
///
/// A timeout is reported as an `io::ErrorKind::TimedOut` error.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(
        name = "tunnel::tcp::dial",
        fields(timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)),
    )
)]
pub async fn dial(endpoint: &str, timeout: Duration) -> io::Result<TcpStream> {
    (tokio::time::timeout(timeout, TcpStream::connect(endpoint)).await).unwrap_or_else(|_| {
        Err(io::Error::new(
            io::ErrorKind::TimedOut,
            format!("dial timed out after {}ms", timeout.as_millis()),
        ))
    })
}

pub fn closed_connection() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "use of closed connection")
}

/// The two halves of one live connection.
///
/// The read half is moved out by the consume loop for the connection's lifetime; the
/// write half stays here for `write` and teardown.
#[derive(Default)]
pub struct ConnectionSlots {
    reader: Mutex<Option<OwnedReadHalf>>,
    writer: Mutex<Option<OwnedWriteHalf>>,
    peer_addr: OnceLock<SocketAddr>,
}

impl ConnectionSlots {
    pub async fn install(&self, stream: TcpStream) {
        if let Ok(addr) = stream.peer_addr() {
            let _ = self.peer_addr.set(addr);
        }
        let (read_half, write_half) = stream.into_split();
        *self.reader.lock().await = Some(read_half);
        *self.writer.lock().await = Some(write_half);
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr.get().copied()
    }

    pub async fn take_reader(&self) -> Option<OwnedReadHalf> {
        self.reader.lock().await.take()
    }

    /// Write all of `msg`, aborting with `NotConnected` if `interrupt` fires first.
    pub async fn write(&self, msg: &[u8], interrupt: &CancellationToken) -> io::Result<()> {
        let mut guard = self.writer.lock().await;
        let Some(writer) = guard.as_mut() else {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "no connection"));
        };
        tokio::select! {
            biased;
            () = interrupt.cancelled() => Err(closed_connection()),
            res = writer.write_all(msg) => res,
        }
    }

    /// Drop both halves, shutting the write direction down first.
    ///
    /// A read half still held by a running consume loop is released when that loop
    /// returns.
    pub async fn shutdown(&self) -> io::Result<()> {
        drop(self.reader.lock().await.take());
        let writer = self.writer.lock().await.take();
        match writer {
            Some(mut w) => w.shutdown().await,
            None => Ok(()),
        }
    }
}
