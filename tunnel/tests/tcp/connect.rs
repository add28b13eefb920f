use std::sync::Arc;
use std::time::{Duration, Instant};

use tunnel::{
    CancellationToken, Source, SourceEvent, SourceState, TcpSource, TransientRetryPolicy,
    TunnelError,
};
use tunnel_mock::RecordingObserver;

use crate::helpers::{Peer, connect, init_tracing};

#[tokio::test]
async fn refused_dial_fails_within_timeout() {
    init_tracing();
    let events = Arc::new(RecordingObserver::new());
    let source = TcpSource::builder("127.0.0.1:1")
        .observer(events.clone())
        .build()
        .unwrap();

    let start = Instant::now();
    let err = source.connect(&CancellationToken::new()).await.unwrap_err();
    assert!(start.elapsed() < Duration::from_secs(4));

    assert!(matches!(err, TunnelError::Connect { .. }), "got {err:?}");
    assert_eq!(err.endpoint(), Some("127.0.0.1:1"));
    assert_eq!(source.state(), SourceState::Disconnected);
    assert_eq!(
        events.count(|e| matches!(e, SourceEvent::ConnectFailed { .. })),
        1
    );
}

#[tokio::test]
async fn unresolvable_endpoint_is_a_connect_error() {
    let source = TcpSource::new("not a host");
    let err = source.connect(&CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, TunnelError::Connect { .. }), "got {err:?}");
}

#[tokio::test]
async fn failed_dial_can_be_retried() {
    let peer = Peer::bind().await;
    let endpoint = peer.endpoint.clone();
    drop(peer);

    let source = TcpSource::new(endpoint);
    assert!(source.connect(&CancellationToken::new()).await.is_err());
    assert_eq!(source.state(), SourceState::Disconnected);
}

#[tokio::test]
async fn ended_scope_skips_dial() {
    init_tracing();
    let peer = Peer::bind().await;
    let events = Arc::new(RecordingObserver::new());
    let source = TcpSource::builder(peer.endpoint.clone())
        .observer(events.clone())
        .build()
        .unwrap();
    let scope = CancellationToken::new();
    scope.cancel();

    source.connect(&scope).await.unwrap();

    assert_eq!(source.state(), SourceState::Disconnected);
    assert!(source.peer_addr().is_none());
    assert!(events.contains(&SourceEvent::ConnectSkipped));
    assert!(peer.stays_idle(Duration::from_millis(100)).await);
}

#[tokio::test]
async fn connect_records_peer_and_state() {
    let conn = connect().await;
    assert_eq!(conn.source.state(), SourceState::Connected);
    assert_eq!(
        conn.source.peer_addr(),
        Some(conn.remote.local_addr().unwrap())
    );
    assert!(conn.events.contains(&SourceEvent::Connected));
}

#[tokio::test]
async fn second_connect_is_rejected() {
    let conn = connect().await;
    let err = conn.source.connect(&conn.scope).await.unwrap_err();
    assert!(
        matches!(
            err,
            TunnelError::InvalidState {
                state: SourceState::Connected,
                ..
            }
        ),
        "got {err:?}"
    );
}

#[tokio::test]
async fn connect_after_close_is_rejected() {
    let source = TcpSource::new("127.0.0.1:1");
    source.close().await;
    let err = source.connect(&CancellationToken::new()).await.unwrap_err();
    assert!(matches!(
        err,
        TunnelError::InvalidState {
            state: SourceState::Closed,
            ..
        }
    ));
}

#[test]
fn builder_rejects_invalid_settings() {
    assert!(matches!(
        TcpSource::builder("  ").build(),
        Err(TunnelError::InvalidArg(_))
    ));
    assert!(matches!(
        TcpSource::builder("127.0.0.1:9").read_chunk_size(0).build(),
        Err(TunnelError::InvalidArg(_))
    ));
    assert!(matches!(
        TcpSource::builder("127.0.0.1:9")
            .connect_timeout(Duration::ZERO)
            .build(),
        Err(TunnelError::InvalidArg(_))
    ));
}

#[test]
fn builder_applies_settings() {
    let source = TcpSource::builder("127.0.0.1:9")
        .connect_timeout(Duration::from_millis(250))
        .read_chunk_size(64)
        .transient_retry(TransientRetryPolicy::bounded(3))
        .build()
        .unwrap();
    let cfg = source.config();
    assert_eq!(cfg.connect_timeout, Duration::from_millis(250));
    assert_eq!(cfg.read_chunk_size, 64);
    assert_eq!(cfg.transient_retry.max_consecutive, Some(3));
    assert_eq!(source.endpoint(), "127.0.0.1:9");
}

#[test]
fn default_source_uses_default_config() {
    let source = TcpSource::new("127.0.0.1:9");
    assert_eq!(source.config().connect_timeout, Duration::from_secs(3));
    assert_eq!(source.config().read_chunk_size, 1024);
    assert_eq!(source.state(), SourceState::Disconnected);
}
