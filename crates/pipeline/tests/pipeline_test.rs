//! End-to-end pipeline tests
//!
//! Each test drives `run_pipeline` over an in-memory or on-disk input and
//! asserts the report counters and sink output.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use logsift_config::Config;
use logsift_pipeline::{run_pipeline, PipelineError};
use logsift_record::DlqEnvelope;
use logsift_report::Report;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Config pointing the report at /dev/null-ish temp location so tests
/// don't litter the working directory.
fn test_config(dir: &tempfile::TempDir) -> Config {
    Config {
        report: dir.path().join("report.json").to_str().unwrap().into(),
        // Batching off by default; individual tests opt in.
        batch_size: 1,
        ..Config::default()
    }
}

fn reader(input: &str) -> Cursor<Vec<u8>> {
    Cursor::new(input.as_bytes().to_vec())
}

#[tokio::test]
async fn test_basic_filtering_counts() {
    let dir = tempfile::tempdir().unwrap();
    let input = "\
{\"ts\":\"2024-01-01T12:00:00Z\",\"level\":\"ERROR\",\"msg\":\"boom\",\"service\":\"svc\"}
{\"ts\":\"2024-01-01T12:00:01Z\",\"level\":\"INFO\",\"msg\":\"fine\",\"service\":\"svc\"}
";
    let mut cfg = test_config(&dir);
    cfg.output_type = "file".into();
    cfg.output = dir.path().join("out.jsonl").to_str().unwrap().into();
    cfg.filter_levels = vec!["ERROR".into()];

    let report = Arc::new(Report::new());
    run_pipeline(
        reader(input),
        &cfg,
        Arc::clone(&report),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    let s = report.snapshot();
    assert_eq!(s.total_lines, 2);
    assert_eq!(s.json_parsed, 2);
    assert_eq!(s.normalized_ok, 2);
    assert_eq!(s.filtered.by_level, 1);
    assert_eq!(s.written_ok, 1);
    assert_eq!(s.written_failed, 0);
    assert!(s.duration_seconds > 0.0);
}

#[tokio::test]
async fn test_filter_and_redact_defaults_end_to_end() {
    let dir = tempfile::tempdir().unwrap();

    // Six lines, alternating levels, each with redactable fields.
    let levels = ["INFO", "WARN", "ERROR", "DEBUG", "WARN", "INFO"];
    let input: String = levels
        .iter()
        .enumerate()
        .map(|(i, level)| {
            format!(
                "{{\"ts\":\"2024-05-01T08:00:0{i}Z\",\"level\":\"{level}\",\"msg\":\"m{i}\",\"service\":\"api\",\"user_email\":\"u{i}@example.com\",\"token\":\"t{i}\",\"keep\":\"v{i}\"}}\n"
            )
        })
        .collect();

    let out_path = dir.path().join("out.jsonl");
    let mut cfg = test_config(&dir);
    cfg.output_type = "file".into();
    cfg.output = out_path.to_str().unwrap().into();
    cfg.filter_levels = vec!["WARN".into(), "ERROR".into()];
    cfg.redact_keys = vec!["user_email".into(), "token".into()];

    let report = Arc::new(Report::new());
    run_pipeline(
        reader(&input),
        &cfg,
        Arc::clone(&report),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    let s = report.snapshot();
    assert_eq!(s.total_lines, 6);
    assert_eq!(s.json_parsed, 6);
    assert_eq!(s.normalized_ok, 6);
    assert_eq!(s.filtered.by_level, 3);
    assert_eq!(s.written_ok, 3);

    let emitted = std::fs::read_to_string(&out_path).unwrap();
    let records: Vec<serde_json::Value> = emitted
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(records.len(), 3);
    for record in &records {
        let fields = record["fields"].as_object().unwrap();
        assert!(fields.contains_key("keep"));
        assert!(!fields.contains_key("user_email"));
        assert!(!fields.contains_key("token"));
    }

    // The report file was written and is parseable.
    let written: logsift_report::ReportSnapshot =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("report.json")).unwrap())
            .unwrap();
    assert_eq!(written.written_ok, 3);
}

#[tokio::test]
async fn test_malformed_and_invalid_lines_are_counted() {
    let dir = tempfile::tempdir().unwrap();
    let input = "\
not json at all
{\"ts\":\"not-a-time\",\"level\":\"INFO\",\"msg\":\"ok\",\"service\":\"svc\"}

{\"ts\":\"2024-01-01T12:00:00Z\",\"level\":\"ERROR\",\"msg\":\"good\"}
";
    let mut cfg = test_config(&dir);
    cfg.output_type = "file".into();
    cfg.output = dir.path().join("out.jsonl").to_str().unwrap().into();
    cfg.filter_levels = vec![];

    let report = Arc::new(Report::new());
    run_pipeline(
        reader(input),
        &cfg,
        Arc::clone(&report),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    let s = report.snapshot();
    // The blank line is skipped without counting.
    assert_eq!(s.total_lines, 3);
    assert_eq!(s.json_failed, 1);
    assert_eq!(s.json_parsed, 2);
    assert_eq!(s.normalized_failed, 1);
    assert_eq!(s.normalized_ok, 1);
    assert_eq!(s.written_ok, 1);
    assert_eq!(s.json_parsed + s.json_failed, s.total_lines);
}

#[tokio::test]
async fn test_batching_writes_everything() {
    let dir = tempfile::tempdir().unwrap();
    let input: String = (0..10)
        .map(|i| {
            format!(
                "{{\"ts\":\"2024-01-01T12:00:00Z\",\"level\":\"ERROR\",\"msg\":\"m{i}\",\"service\":\"svc\"}}\n"
            )
        })
        .collect();

    let out_path = dir.path().join("out.jsonl");
    let mut cfg = test_config(&dir);
    cfg.output_type = "file".into();
    cfg.output = out_path.to_str().unwrap().into();
    cfg.batch_size = 5;
    cfg.batch_flush_interval_ms = 100;
    cfg.filter_levels = vec![];

    let report = Arc::new(Report::new());
    run_pipeline(
        reader(&input),
        &cfg,
        Arc::clone(&report),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(report.snapshot().written_ok, 10);
    let emitted = std::fs::read_to_string(&out_path).unwrap();
    assert_eq!(emitted.lines().count(), 10);
}

#[tokio::test]
async fn test_unknown_transform_is_startup_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = test_config(&dir);
    cfg.transforms = vec!["does_not_exist".into()];

    let report = Arc::new(Report::new());
    let err = run_pipeline(
        reader("{}"),
        &cfg,
        Arc::clone(&report),
        CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, PipelineError::Transform(_)));
    assert_eq!(report.snapshot().total_lines, 0, "no input consumed");
}

#[tokio::test]
async fn test_cancellation_mid_run() {
    let dir = tempfile::tempdir().unwrap();
    // Large enough that cancellation lands mid-run even on a fast machine.
    let line = "{\"ts\":\"2024-01-01T12:00:00Z\",\"level\":\"ERROR\",\"msg\":\"x\",\"service\":\"svc\"}\n";
    let total = 100_000u64;
    let input: String = line.repeat(total as usize);

    let mut cfg = test_config(&dir);
    cfg.output_type = "file".into();
    cfg.output = dir.path().join("out.jsonl").to_str().unwrap().into();
    cfg.filter_levels = vec![];

    let report = Arc::new(Report::new());
    let cancel = CancellationToken::new();
    let canceller = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            cancel.cancel();
        })
    };

    let result = run_pipeline(reader(&input), &cfg, Arc::clone(&report), cancel).await;
    canceller.await.unwrap();

    assert!(matches!(result, Err(PipelineError::Cancelled)));

    let s = report.snapshot();
    assert!(s.written_ok <= total);
    assert_eq!(s.json_parsed + s.json_failed, s.total_lines);
    assert!(s.written_ok + s.written_failed <= s.normalized_ok);
}

#[tokio::test]
async fn test_dlq_receives_exhausted_records() {
    let dir = tempfile::tempdir().unwrap();
    let input = "{\"ts\":\"2024-01-01T12:00:00Z\",\"level\":\"ERROR\",\"msg\":\"x\",\"service\":\"svc\"}\n";

    // Point the HTTP sink at a server that always refuses.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(http_stub(listener, vec![500, 500, 500, 500]));

    let dlq_path = dir.path().join("dead.jsonl");
    let mut cfg = test_config(&dir);
    cfg.output_type = "http".into();
    cfg.output = format!("http://{addr}/ingest");
    cfg.dlq = dlq_path.to_str().unwrap().into();
    cfg.filter_levels = vec![];
    cfg.sink_max_retries = 1;
    cfg.sink_backoff_base_ms = 1;
    cfg.sink_backoff_max_ms = 5;

    let report = Arc::new(Report::new());
    run_pipeline(
        reader(input),
        &cfg,
        Arc::clone(&report),
        CancellationToken::new(),
    )
    .await
    .unwrap();
    server.abort();

    let s = report.snapshot();
    assert_eq!(s.written_failed, 1);
    assert_eq!(s.dlq_written, 1);
    assert!(s.dlq_written <= s.written_failed);
    assert_eq!(s.dlq_reasons.len(), 1);

    let dlq_line = std::fs::read_to_string(&dlq_path).unwrap();
    let envelope: DlqEnvelope = serde_json::from_str(dlq_line.lines().next().unwrap()).unwrap();
    assert_eq!(envelope.record.message, "x");
    assert!(envelope.reason.contains("500"));
}

#[tokio::test]
async fn test_http_retry_then_success() {
    let dir = tempfile::tempdir().unwrap();
    let input = "{\"ts\":\"2024-01-01T12:00:00Z\",\"level\":\"ERROR\",\"msg\":\"x\",\"service\":\"svc\"}\n";

    // 500 twice, then 200; the retry coordinator owns the retries.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(http_stub(listener, vec![500, 500, 200]));

    let mut cfg = test_config(&dir);
    cfg.output_type = "http".into();
    cfg.output = format!("http://{addr}/ingest");
    cfg.filter_levels = vec![];
    cfg.sink_max_retries = 3;
    cfg.sink_backoff_base_ms = 10;
    cfg.sink_backoff_max_ms = 50;

    let report = Arc::new(Report::new());
    run_pipeline(
        reader(input),
        &cfg,
        Arc::clone(&report),
        CancellationToken::new(),
    )
    .await
    .unwrap();
    server.abort();

    let s = report.snapshot();
    assert_eq!(s.written_ok, 1);
    assert_eq!(s.written_failed, 0);
    assert_eq!(s.retry_stats.total_retries, 2);
    assert_eq!(s.retry_stats.writes_with_retries, 1);
    assert_eq!(s.retry_stats.max_retries_per_write, 2);
}

/// Minimal HTTP/1.1 stub: answers each connection with the next status
/// from `statuses`, repeating the last one when the list runs out.
async fn http_stub(listener: TcpListener, statuses: Vec<u16>) {
    let mut served = 0usize;
    loop {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };
        let status = *statuses
            .get(served)
            .or(statuses.last())
            .unwrap_or(&500);
        served += 1;

        // Read the request head plus body; the client sends small JSON
        // bodies, so a single buffered read pass is enough before replying.
        let mut buf = vec![0u8; 16 * 1024];
        let mut total = 0usize;
        loop {
            match socket.read(&mut buf[total..]).await {
                Ok(0) => break,
                Ok(n) => {
                    total += n;
                    if request_complete(&buf[..total]) {
                        break;
                    }
                }
                Err(_) => break,
            }
        }

        let reason = if status == 200 { "OK" } else { "Internal Server Error" };
        let response = format!(
            "HTTP/1.1 {status} {reason}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
        );
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
    }
}

/// A request is complete once the body advertised by content-length has
/// fully arrived after the blank line.
fn request_complete(data: &[u8]) -> bool {
    let Some(head_end) = data.windows(4).position(|w| w == b"\r\n\r\n") else {
        return false;
    };
    let head = String::from_utf8_lossy(&data[..head_end]);
    let content_length = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            if name.eq_ignore_ascii_case("content-length") {
                value.trim().parse::<usize>().ok()
            } else {
                None
            }
        })
        .unwrap_or(0);
    data.len() >= head_end + 4 + content_length
}
