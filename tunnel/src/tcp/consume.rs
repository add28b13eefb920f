use std::io;

use tokio::io::{AsyncRead, AsyncReadExt};
use tunnel_core::{RetryDecision, SourceEvent, SourceState, TransientRetry, TunnelError, is_transient};

use super::SourceInner;
use super::connection::closed_connection;

/// Run the read loop for the connection's lifetime.
///
/// The loop never looks at the cancellation scope: teardown fires `inner.interrupt`,
/// which fails the pending read and ends the loop through the error path.
pub async fn consume(inner: &SourceInner) -> Result<(), TunnelError> {
    let Some(mut reader) = inner.conn.take_reader().await else {
        return Err(missing_reader(inner));
    };

    inner.observe(&SourceEvent::ConsumeStarted);
    let res = read_loop(inner, &mut reader).await;
    inner.observe(&SourceEvent::ConsumeEnded {
        error: res.as_ref().err().map(ToString::to_string),
    });
    res
}

/// Error for a consume call that found no read half to take.
///
/// Teardown winning the race against `consume` is reported like an interrupted read.
fn missing_reader(inner: &SourceInner) -> TunnelError {
    if inner.interrupt.is_cancelled() {
        return TunnelError::read(&inner.endpoint, closed_connection());
    }
    match inner.state() {
        SourceState::Closed => TunnelError::read(&inner.endpoint, closed_connection()),
        SourceState::Connected => TunnelError::Other(format!(
            "read half for {} was already taken by an earlier consume",
            inner.endpoint
        )),
        SourceState::Disconnected | SourceState::Connecting => {
            TunnelError::not_connected(&inner.endpoint)
        }
    }
}

#[cfg_attr(
    feature = "tracing",
    tracing::instrument(
        name = "tunnel::tcp::read_loop",
        skip_all,
        fields(endpoint = %inner.endpoint, chunk_size = inner.cfg.read_chunk_size),
    )
)]
async fn read_loop<R>(inner: &SourceInner, reader: &mut R) -> Result<(), TunnelError>
where
    R: AsyncRead + Unpin,
{
    let mut retry = TransientRetry::new(inner.cfg.transient_retry);
    loop {
        let mut buffer = vec![0u8; inner.cfg.read_chunk_size];
        let res = tokio::select! {
            biased;
            () = inner.interrupt.cancelled() => Err(closed_connection()),
            res = reader.read(&mut buffer) => res,
        };

        match res {
            Ok(0) => {
                return Err(TunnelError::read(
                    &inner.endpoint,
                    io::Error::new(io::ErrorKind::UnexpectedEof, "connection closed by peer"),
                ));
            }
            Ok(n) => {
                retry.reset();
                buffer.truncate(n);
                if inner.queue.send(buffer).await.is_err() {
                    return Err(TunnelError::DeliveryClosed {
                        endpoint: inner.endpoint.clone(),
                    });
                }
            }
            Err(err) if is_transient(&err) => match retry.on_transient() {
                RetryDecision::Retry(delay) => {
                    inner.observe(&SourceEvent::TransientReadError {
                        attempt: retry.consecutive(),
                        error: err.to_string(),
                    });
                    if !delay.is_zero() {
                        tokio::select! {
                            biased;
                            () = inner.interrupt.cancelled() => {
                                return Err(TunnelError::read(&inner.endpoint, closed_connection()));
                            }
                            () = tokio::time::sleep(delay) => {}
                        }
                    }
                }
                RetryDecision::GiveUp { attempts } => {
                    return Err(TunnelError::TransientRetriesExhausted {
                        endpoint: inner.endpoint.clone(),
                        attempts,
                    });
                }
            },
            Err(err) => return Err(TunnelError::read(&inner.endpoint, err)),
        }
    }
}
