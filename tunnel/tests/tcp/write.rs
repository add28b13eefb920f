use std::io;

use tokio::io::AsyncReadExt;
use tunnel::{Source, TcpSource, TunnelError};

use crate::helpers::{PROMPT, connect};

#[tokio::test]
async fn writes_reach_the_peer_in_order() {
    let mut conn = connect().await;

    conn.source.write(b"ping").await.unwrap();
    conn.source.write(b"pong").await.unwrap();

    let mut buf = [0u8; 8];
    tokio::time::timeout(PROMPT, conn.remote.read_exact(&mut buf))
        .await
        .expect("peer read")
        .unwrap();
    assert_eq!(&buf, b"pingpong");
}

#[tokio::test]
async fn write_after_close_fails() {
    let conn = connect().await;
    conn.scope.cancel();
    tokio::time::timeout(PROMPT, conn.source.closed())
        .await
        .expect("closed");

    let err = conn.source.write(b"late").await.unwrap_err();
    assert!(matches!(err, TunnelError::Write { .. }), "got {err:?}");
    assert_eq!(err.io_kind(), Some(io::ErrorKind::NotConnected));
}

#[tokio::test]
async fn write_before_connect_fails() {
    let source = TcpSource::new("127.0.0.1:9");
    let err = source.write(b"early").await.unwrap_err();
    assert_eq!(err.io_kind(), Some(io::ErrorKind::NotConnected));
}
