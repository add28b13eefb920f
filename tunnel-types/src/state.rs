use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle of a source's connection handle.
///
/// `Closed` is terminal: a source is never reconnected after teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SourceState {
    /// No connection has been established yet.
    #[default]
    Disconnected,
    /// A dial is in flight.
    Connecting,
    /// A connection handle is present.
    Connected,
    /// Teardown ran; the handle is gone and the delivery queue is closed.
    Closed,
}

impl SourceState {
    /// Returns true while a connection handle is held.
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for SourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Closed => "closed",
        })
    }
}
