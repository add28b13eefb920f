// Shared fixtures for the TCP source tests: a loopback peer and a recording observer.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tunnel::{CancellationToken, Source, TcpSource, TcpSourceBuilder, TunnelError};
use tunnel_mock::RecordingObserver;

/// Generous bound for anything that should happen "promptly" on loopback.
pub const PROMPT: Duration = Duration::from_secs(2);

/// Install a test subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A listening loopback socket standing in for the remote endpoint.
pub struct Peer {
    listener: TcpListener,
    pub endpoint: String,
}

impl Peer {
    pub async fn bind() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind loopback");
        let endpoint = listener.local_addr().expect("local addr").to_string();
        Self { listener, endpoint }
    }

    pub async fn accept(&self) -> TcpStream {
        let (stream, _) = tokio::time::timeout(PROMPT, self.listener.accept())
            .await
            .expect("source dialed in time")
            .expect("accept");
        stream
    }

    /// Returns true if nobody dials within `window`.
    pub async fn stays_idle(&self, window: Duration) -> bool {
        tokio::time::timeout(window, self.listener.accept())
            .await
            .is_err()
    }
}

/// A connected source, the peer's end of its socket, and the scope it was connected with.
pub struct Connected {
    pub source: TcpSource,
    pub remote: TcpStream,
    pub scope: CancellationToken,
    pub events: Arc<RecordingObserver>,
}

/// Connect a source built from `configure` to a fresh loopback peer.
pub async fn connect_with(
    configure: impl FnOnce(TcpSourceBuilder) -> TcpSourceBuilder,
) -> Connected {
    init_tracing();
    let peer = Peer::bind().await;
    let events = Arc::new(RecordingObserver::new());
    let source = configure(TcpSource::builder(peer.endpoint.clone()))
        .observer(events.clone())
        .build()
        .expect("valid builder");
    let scope = CancellationToken::new();
    let (res, remote) = tokio::join!(source.connect(&scope), peer.accept());
    res.expect("connect");
    Connected {
        source,
        remote,
        scope,
        events,
    }
}

pub async fn connect() -> Connected {
    connect_with(|b| b).await
}

/// Run `consume` on its own task.
pub fn spawn_consume(
    source: &TcpSource,
    scope: &CancellationToken,
) -> JoinHandle<Result<(), TunnelError>> {
    let source = source.clone();
    let scope = scope.clone();
    tokio::spawn(async move { source.consume(&scope).await })
}

/// Await a consume task, failing the test if it does not end promptly.
pub async fn join_consume(handle: JoinHandle<Result<(), TunnelError>>) -> Result<(), TunnelError> {
    tokio::time::timeout(PROMPT, handle)
        .await
        .expect("consume ended in time")
        .expect("consume task did not panic")
}
