use std::io;

use thiserror::Error;

use crate::SourceState;

/// Unified error type for tunnel sources.
///
/// Dial, read and write failures keep the underlying `io::Error` as their source so callers
/// can inspect the `io::ErrorKind`. Close failures never surface here; they are reported to
/// the source's observer instead.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TunnelError {
    /// Dialing the endpoint failed or timed out.
    #[error("could not connect to {endpoint}: {source}")]
    Connect {
        /// Endpoint that was dialed.
        endpoint: String,
        /// Underlying dial failure.
        #[source]
        source: io::Error,
    },

    /// A non-transient read failure ended the consume loop.
    #[error("could not read from tcp on {endpoint}: {source}")]
    Read {
        /// Endpoint the connection belongs to.
        endpoint: String,
        /// Underlying read failure.
        #[source]
        source: io::Error,
    },

    /// Writing to the connection failed.
    #[error("could not write to {endpoint}: {source}")]
    Write {
        /// Endpoint the connection belongs to.
        endpoint: String,
        /// Underlying write failure.
        #[source]
        source: io::Error,
    },

    /// An operation that requires a live connection was invoked without one.
    #[error("no connection to {endpoint}")]
    NotConnected {
        /// Endpoint of the source.
        endpoint: String,
    },

    /// The source is not in a state that allows the requested operation.
    #[error("source for {endpoint} is {state}")]
    InvalidState {
        /// Endpoint of the source.
        endpoint: String,
        /// State observed when the operation was rejected.
        state: SourceState,
    },

    /// The delivery queue was closed while a chunk was still in flight.
    #[error("delivery queue for {endpoint} closed")]
    DeliveryClosed {
        /// Endpoint of the source.
        endpoint: String,
    },

    /// Consecutive transient read failures exceeded the configured bound.
    #[error("gave up reading from {endpoint} after {attempts} transient failures")]
    TransientRetriesExhausted {
        /// Endpoint of the source.
        endpoint: String,
        /// Number of consecutive transient failures observed.
        attempts: u32,
    },

    /// Invalid input argument.
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// Unknown/opaque error.
    #[error("{0}")]
    Other(String),
}

impl TunnelError {
    /// Helper: build a `Connect` error for an endpoint and dial failure.
    pub fn connect(endpoint: impl Into<String>, source: io::Error) -> Self {
        Self::Connect {
            endpoint: endpoint.into(),
            source,
        }
    }

    /// Helper: build a `Read` error for an endpoint and read failure.
    pub fn read(endpoint: impl Into<String>, source: io::Error) -> Self {
        Self::Read {
            endpoint: endpoint.into(),
            source,
        }
    }

    /// Helper: build a `Write` error for an endpoint and write failure.
    pub fn write(endpoint: impl Into<String>, source: io::Error) -> Self {
        Self::Write {
            endpoint: endpoint.into(),
            source,
        }
    }

    /// Helper: build a `NotConnected` error.
    pub fn not_connected(endpoint: impl Into<String>) -> Self {
        Self::NotConnected {
            endpoint: endpoint.into(),
        }
    }

    /// Endpoint the error refers to, if any.
    #[must_use]
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::Connect { endpoint, .. }
            | Self::Read { endpoint, .. }
            | Self::Write { endpoint, .. }
            | Self::NotConnected { endpoint }
            | Self::InvalidState { endpoint, .. }
            | Self::DeliveryClosed { endpoint }
            | Self::TransientRetriesExhausted { endpoint, .. } => Some(endpoint),
            Self::InvalidArg(_) | Self::Other(_) => None,
        }
    }

    /// Kind of the underlying I/O failure for connect, read and write errors.
    #[must_use]
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Self::Connect { source, .. } | Self::Read { source, .. } | Self::Write { source, .. } => {
                Some(source.kind())
            }
            _ => None,
        }
    }

    /// Returns true if the error means the connection was torn down locally.
    ///
    /// This is how a consume loop ends after its cancellation scope finishes: the pending
    /// read is interrupted and reports `NotConnected`.
    #[must_use]
    pub fn is_connection_closed(&self) -> bool {
        match self {
            Self::Read { source, .. } => source.kind() == io::ErrorKind::NotConnected,
            Self::DeliveryClosed { .. } => true,
            _ => false,
        }
    }
}
