use std::time::Duration;

use tokio::io::AsyncReadExt;
use tunnel::{Source, SourceEvent, SourceState};
use tunnel_mock::conformance::{next_within, Next};

use crate::helpers::{PROMPT, connect, join_consume, spawn_consume};

#[tokio::test]
async fn scope_end_tears_everything_down() {
    let mut conn = connect().await;
    let reader = conn.source.reader();
    let handle = spawn_consume(&conn.source, &conn.scope);

    conn.scope.cancel();
    let err = join_consume(handle).await.unwrap_err();
    assert!(err.is_connection_closed(), "got {err:?}");

    assert_eq!(next_within(&reader, PROMPT).await, Next::End);
    tokio::time::timeout(PROMPT, conn.source.closed())
        .await
        .expect("closed");
    assert_eq!(conn.source.state(), SourceState::Closed);

    // The peer sees an orderly shutdown.
    let mut buf = [0u8; 8];
    let n = tokio::time::timeout(PROMPT, conn.remote.read(&mut buf))
        .await
        .expect("peer read")
        .unwrap();
    assert_eq!(n, 0);
}

#[tokio::test]
async fn scope_end_without_consume_still_closes_queue() {
    let conn = connect().await;
    let reader = conn.source.reader();

    conn.scope.cancel();
    assert_eq!(next_within(&reader, PROMPT).await, Next::End);
    assert_eq!(conn.source.state(), SourceState::Closed);
    assert_eq!(conn.events.count(|e| *e == SourceEvent::Closed), 1);
}

#[tokio::test]
async fn close_runs_once() {
    let conn = connect().await;

    conn.source.close().await;
    conn.source.close().await;
    conn.scope.cancel();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(conn.events.count(|e| *e == SourceEvent::CloseStarted), 1);
    assert_eq!(conn.events.count(|e| *e == SourceEvent::Closed), 1);
    assert!(conn.events.count(|e| *e == SourceEvent::CloseIgnored) >= 1);
}

#[tokio::test]
async fn explicit_close_interrupts_consume() {
    let conn = connect().await;
    let reader = conn.source.reader();
    let handle = spawn_consume(&conn.source, &conn.scope);

    conn.source.close().await;
    let err = join_consume(handle).await.unwrap_err();
    assert!(err.is_connection_closed(), "got {err:?}");
    assert!(reader.is_closed());
}

#[tokio::test]
async fn consume_after_teardown_reports_closed_connection() {
    let conn = connect().await;
    conn.source.close().await;

    let err = conn.source.consume(&conn.scope).await.unwrap_err();
    assert!(err.is_connection_closed(), "got {err:?}");
}

#[tokio::test]
async fn consume_after_scope_end_reports_closed_connection() {
    let conn = connect().await;
    conn.scope.cancel();
    tokio::time::timeout(PROMPT, conn.source.closed())
        .await
        .expect("closed");

    let err = conn.source.consume(&conn.scope).await.unwrap_err();
    assert!(err.is_connection_closed(), "got {err:?}");
}

#[tokio::test]
async fn dropped_source_releases_watcher() {
    let conn = connect().await;
    let events = conn.events.clone();
    drop(conn.source);
    tokio::time::sleep(Duration::from_millis(20)).await;
    conn.scope.cancel();
    tokio::time::sleep(Duration::from_millis(20)).await;
    // The watcher exited with the source; nothing is left to tear down.
    assert_eq!(events.count(|e| *e == SourceEvent::CloseStarted), 0);
}
