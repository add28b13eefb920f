use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tunnel_core::{
    CancellationToken, DeliveryReader, Observer, Source, SourceConfig, SourceEvent, SourceState,
    TransientRetryPolicy, TunnelError, default_observer,
};

use crate::tcp::{SourceInner, connection, consume, watcher};

/// Outbound TCP source bound to one endpoint.
///
/// Cloning is cheap and every clone drives the same connection and delivery queue.
#[derive(Clone)]
pub struct TcpSource {
    inner: Arc<SourceInner>,
}

impl std::fmt::Debug for TcpSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpSource")
            .field("endpoint", &self.inner.endpoint)
            .field("state", &self.inner.state())
            .finish_non_exhaustive()
    }
}

/// Builder for constructing a `TcpSource` with custom configuration.
pub struct TcpSourceBuilder {
    endpoint: String,
    cfg: SourceConfig,
    observer: Option<Arc<dyn Observer>>,
}

impl TcpSourceBuilder {
    /// Create a builder for `endpoint` (`host:port`) with default configuration.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            cfg: SourceConfig::default(),
            observer: None,
        }
    }

    /// Replace the whole configuration.
    #[must_use]
    pub const fn config(mut self, cfg: SourceConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Upper bound on the dial performed by `connect`. Defaults to 3 seconds.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.connect_timeout = timeout;
        self
    }

    /// Maximum number of bytes per delivered chunk. Defaults to 1024.
    #[must_use]
    pub const fn read_chunk_size(mut self, size: usize) -> Self {
        self.cfg.read_chunk_size = size;
        self
    }

    /// How transient read failures are retried.
    ///
    /// The default retries immediately and without limit, which can spin if the
    /// condition persists; a bound or backoff trades that for surfacing an error.
    #[must_use]
    pub const fn transient_retry(mut self, policy: TransientRetryPolicy) -> Self {
        self.cfg.transient_retry = policy;
        self
    }

    /// Inject the collaborator that receives lifecycle and error events.
    #[must_use]
    pub fn observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Build the source.
    ///
    /// # Errors
    /// Returns `InvalidArg` if the endpoint is empty or the configuration is invalid.
    pub fn build(self) -> Result<TcpSource, TunnelError> {
        if self.endpoint.trim().is_empty() {
            return Err(TunnelError::InvalidArg("endpoint must not be empty".into()));
        }
        self.cfg.validate()?;
        let observer = self.observer.unwrap_or_else(default_observer);
        Ok(TcpSource {
            inner: Arc::new(SourceInner::new(self.endpoint, self.cfg, observer)),
        })
    }
}

impl TcpSource {
    /// Create a source for `endpoint` with default configuration and observer.
    ///
    /// The endpoint is not validated until `connect` dials it.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(SourceInner::new(
                endpoint.into(),
                SourceConfig::default(),
                default_observer(),
            )),
        }
    }

    /// Start building a source for `endpoint`.
    #[must_use]
    pub fn builder(endpoint: impl Into<String>) -> TcpSourceBuilder {
        TcpSourceBuilder::new(endpoint)
    }

    /// Configuration the source was built with.
    #[must_use]
    pub fn config(&self) -> &SourceConfig {
        &self.inner.cfg
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SourceState {
        self.inner.state()
    }

    /// Address of the remote end, once connected.
    #[must_use]
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.inner.conn.peer_addr()
    }

    /// Wait until teardown has finished.
    pub async fn closed(&self) {
        let mut rx = self.inner.state.subscribe();
        let _ = rx.wait_for(|s| *s == SourceState::Closed).await;
    }
}

#[async_trait]
impl Source for TcpSource {
    fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    fn reader(&self) -> DeliveryReader {
        self.inner.queue.reader()
    }

    async fn connect(&self, scope: &CancellationToken) -> Result<(), TunnelError> {
        let inner = &self.inner;
        if scope.is_cancelled() {
            inner.observe(&SourceEvent::ConnectSkipped);
            return Ok(());
        }
        if !inner.transition(SourceState::Disconnected, SourceState::Connecting) {
            return Err(TunnelError::InvalidState {
                endpoint: inner.endpoint.clone(),
                state: inner.state(),
            });
        }

        let timeout = inner.cfg.connect_timeout;
        inner.observe(&SourceEvent::Connecting { timeout });
        let stream = match connection::dial(&inner.endpoint, timeout).await {
            Ok(stream) => stream,
            Err(err) => {
                inner.observe(&SourceEvent::ConnectFailed {
                    error: err.to_string(),
                });
                inner.transition(SourceState::Connecting, SourceState::Disconnected);
                return Err(TunnelError::connect(&inner.endpoint, err));
            }
        };

        inner.conn.install(stream).await;
        if !inner.transition(SourceState::Connecting, SourceState::Connected) {
            // Closed while dialing; the teardown already ran, so release the socket here.
            let _ = inner.conn.shutdown().await;
            return Err(TunnelError::InvalidState {
                endpoint: inner.endpoint.clone(),
                state: inner.state(),
            });
        }

        watcher::spawn_watcher(inner, scope.clone());
        inner.observe(&SourceEvent::Connected);
        Ok(())
    }

    async fn consume(&self, _scope: &CancellationToken) -> Result<(), TunnelError> {
        consume::consume(&self.inner).await
    }

    async fn write(&self, msg: &[u8]) -> Result<(), TunnelError> {
        self.inner
            .conn
            .write(msg, &self.inner.interrupt)
            .await
            .map_err(|err| TunnelError::write(&self.inner.endpoint, err))
    }

    async fn close(&self) {
        self.inner.close().await;
    }
}
