//! Tests for the HTTP sink
//!
//! Driven against a raw TCP stub rather than a mock crate; the sink only
//! needs status lines and a closed connection.

use super::*;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Answers each connection with the next status from `statuses`,
/// repeating the last entry once the list runs out.
async fn spawn_stub(statuses: Vec<u16>) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));

    let hits_clone = Arc::clone(&hits);
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let served = hits_clone.fetch_add(1, Ordering::SeqCst);
            let status = *statuses.get(served).or(statuses.last()).unwrap_or(&500);

            let mut buf = [0u8; 8192];
            let _ = socket.read(&mut buf).await;

            let reason = if status < 400 { "OK" } else { "Internal Server Error" };
            let response = format!(
                "HTTP/1.1 {status} {reason}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });

    (format!("http://{addr}/ingest"), hits)
}

#[tokio::test]
async fn test_2xx_is_success() {
    let (url, hits) = spawn_stub(vec![200]).await;
    let mut sink = HttpSink::new(url, 0, Duration::from_millis(1), CancellationToken::new())
        .unwrap();

    sink.write(&json!({"ok": true})).await.unwrap();
    sink.close().await.unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_inner_backoff_retries_then_succeeds() {
    let (url, hits) = spawn_stub(vec![500, 503, 200]).await;
    let mut sink = HttpSink::new(url, 3, Duration::from_millis(1), CancellationToken::new())
        .unwrap();

    sink.write(&json!({"n": 1})).await.unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_exhaustion_returns_last_status_error() {
    let (url, hits) = spawn_stub(vec![500]).await;
    let mut sink = HttpSink::new(url, 2, Duration::from_millis(1), CancellationToken::new())
        .unwrap();

    let err = sink.write(&json!({})).await.unwrap_err();
    assert!(err.to_string().contains("500"), "got: {err}");
    assert_eq!(hits.load(Ordering::SeqCst), 3, "first try + 2 retries");
}

#[tokio::test]
async fn test_non_2xx_statuses_are_transient() {
    let (url, _) = spawn_stub(vec![404]).await;
    let mut sink = HttpSink::new(url, 0, Duration::from_millis(1), CancellationToken::new())
        .unwrap();

    let err = sink.write(&json!({})).await.unwrap_err();
    assert!(matches!(err, SinkError::Write(_)));
}

#[tokio::test]
async fn test_cancelled_write_stops_early() {
    let (url, hits) = spawn_stub(vec![500]).await;
    let cancel = CancellationToken::new();
    cancel.cancel();
    let mut sink = HttpSink::new(url, 5, Duration::from_secs(10), cancel).unwrap();

    let err = sink.write(&json!({})).await.unwrap_err();
    assert!(matches!(err, SinkError::Cancelled));
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_empty_url_is_open_error() {
    let err = HttpSink::new(
        "",
        0,
        Duration::from_millis(1),
        CancellationToken::new(),
    )
    .unwrap_err();
    assert!(matches!(err, SinkError::Open(_)));
}
