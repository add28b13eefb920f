//! Error and configuration primitives shared by every tunnel source implementation.
#![warn(missing_docs)]

mod config;
mod error;
mod state;

pub use config::{BackoffConfig, SourceConfig, TransientRetryPolicy};
pub use error::TunnelError;
pub use state::SourceState;
