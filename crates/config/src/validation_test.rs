//! Tests for config validation

use crate::{Config, ConfigError};

#[test]
fn test_default_config_is_valid() {
    Config::default().validate().unwrap();
}

#[test]
fn test_unknown_output_type() {
    let cfg = Config {
        output_type: "carrier-pigeon".into(),
        ..Config::default()
    };
    let err = cfg.validate().unwrap_err();
    assert!(err.to_string().contains("invalid output_type"));
}

#[test]
fn test_reserved_output_types_pass_validation() {
    for ty in ["s3", "kafka"] {
        let cfg = Config {
            output_type: ty.into(),
            ..Config::default()
        };
        cfg.validate().unwrap();
    }
}

#[test]
fn test_file_output_requires_path() {
    for ty in ["file", "rotate", "rotating", "http", "webhook"] {
        let cfg = Config {
            output_type: ty.into(),
            output: String::new(),
            ..Config::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(
            err.to_string().contains("output is required"),
            "type {ty} should require output"
        );
    }
}

#[test]
fn test_negative_numerics_all_collected() {
    let cfg = Config {
        max_workers: -1,
        queue_size: -2,
        sink_max_retries: -3,
        ..Config::default()
    };
    let err = cfg.validate().unwrap_err();
    let ConfigError::Validation { violations } = err else {
        panic!("expected validation error");
    };
    assert_eq!(violations.len(), 3);
    assert!(violations[0].contains("max_workers"));
    assert!(violations[1].contains("queue_size"));
    assert!(violations[2].contains("sink_max_retries"));
}

#[test]
fn test_backoff_max_below_base() {
    let cfg = Config {
        sink_backoff_base_ms: 500,
        sink_backoff_max_ms: 100,
        ..Config::default()
    };
    let err = cfg.validate().unwrap_err();
    assert!(err.to_string().contains("sink_backoff_max_ms"));
}

#[test]
fn test_jitter_out_of_range() {
    let cfg = Config {
        sink_backoff_jitter_pct: 1.5,
        ..Config::default()
    };
    assert!(cfg.validate().is_err());

    let cfg = Config {
        sink_backoff_jitter_pct: -0.1,
        ..Config::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_dlq_s3_rejected() {
    let cfg = Config {
        dlq: "s3://bucket/dead-letters".into(),
        ..Config::default()
    };
    let err = cfg.validate().unwrap_err();
    assert!(err.to_string().contains("s3://"));
}

#[test]
fn test_invalid_log_settings() {
    let cfg = Config {
        log_level: "verbose".into(),
        log_format: "xml".into(),
        ..Config::default()
    };
    let err = cfg.validate().unwrap_err();
    let text = err.to_string();
    assert!(text.contains("invalid log_level"));
    assert!(text.contains("invalid log_format"));
}
