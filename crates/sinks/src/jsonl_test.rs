//! Tests for the JSONL sink

use super::*;
use serde_json::json;
use std::io::Read as _;

#[tokio::test]
async fn test_writes_one_object_per_line() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let path = file.path().to_path_buf();

    let mut sink = JsonlSink::new(Box::new(std::fs::File::create(&path).unwrap()));
    sink.write(&json!({"a": 1})).await.unwrap();
    sink.write(&json!({"b": "two"})).await.unwrap();
    sink.close().await.unwrap();

    let mut contents = String::new();
    std::fs::File::open(&path)
        .unwrap()
        .read_to_string(&mut contents)
        .unwrap();

    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], r#"{"a":1}"#);
    assert_eq!(lines[1], r#"{"b":"two"}"#);
    assert!(contents.ends_with('\n'), "every record is newline-terminated");
}

#[tokio::test]
async fn test_records_visible_before_close() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let path = file.path().to_path_buf();

    let mut sink = JsonlSink::new(Box::new(std::fs::File::create(&path).unwrap()));
    sink.write(&json!({"early": true})).await.unwrap();

    // Flushed per record, so the line is on disk before close().
    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents, "{\"early\":true}\n");

    sink.close().await.unwrap();
}
