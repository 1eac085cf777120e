//! Configuration validation
//!
//! Runs on the fully merged config. Every rule is checked and all
//! violations are reported in one error rather than failing on the first.

use crate::{Config, ConfigError, Result};

#[cfg(test)]
#[path = "validation_test.rs"]
mod tests;

/// Output types the pipeline understands. `s3` and `kafka` are reserved:
/// they pass validation and fail at sink construction with "not implemented".
const KNOWN_OUTPUT_TYPES: &[&str] = &[
    "stdout", "file", "rotate", "rotating", "http", "webhook", "s3", "kafka",
];

const KNOWN_LOG_LEVELS: &[&str] = &["debug", "info", "warn", "error"];
const KNOWN_LOG_FORMATS: &[&str] = &["json", "text"];

pub fn validate(cfg: &Config) -> Result<()> {
    let mut violations = Vec::new();

    let output_type = cfg.output_type.to_lowercase();
    if !cfg.output_type.is_empty() && !KNOWN_OUTPUT_TYPES.contains(&output_type.as_str()) {
        violations.push(format!(
            "invalid output_type {:?}: must be one of {}",
            cfg.output_type,
            KNOWN_OUTPUT_TYPES.join(", ")
        ));
    }

    let needs_output = matches!(
        output_type.as_str(),
        "file" | "rotate" | "rotating" | "http" | "webhook"
    );
    if needs_output && cfg.output.is_empty() {
        violations.push(format!(
            "output is required when output_type is {:?}",
            cfg.output_type
        ));
    }

    let non_negative = [
        ("max_workers", cfg.max_workers),
        ("queue_size", cfg.queue_size),
        ("sink_max_retries", cfg.sink_max_retries),
        ("sink_backoff_base_ms", cfg.sink_backoff_base_ms),
        ("sink_backoff_max_ms", cfg.sink_backoff_max_ms),
        ("output_max_bytes", cfg.output_max_bytes),
        ("output_max_files", cfg.output_max_files),
        ("batch_size", cfg.batch_size),
        ("batch_flush_interval_ms", cfg.batch_flush_interval_ms),
        ("shutdown_timeout_seconds", cfg.shutdown_timeout_seconds),
    ];
    for (name, value) in non_negative {
        if value < 0 {
            violations.push(format!("{name} cannot be negative: {value}"));
        }
    }

    if cfg.sink_backoff_max_ms > 0
        && cfg.sink_backoff_base_ms > 0
        && cfg.sink_backoff_max_ms < cfg.sink_backoff_base_ms
    {
        violations.push(format!(
            "sink_backoff_max_ms ({}) must be >= sink_backoff_base_ms ({})",
            cfg.sink_backoff_max_ms, cfg.sink_backoff_base_ms
        ));
    }

    if !(0.0..=1.0).contains(&cfg.sink_backoff_jitter_pct) {
        violations.push(format!(
            "sink_backoff_jitter_pct must be between 0.0 and 1.0, got: {:.2}",
            cfg.sink_backoff_jitter_pct
        ));
    }

    if !cfg.dlq.is_empty() {
        if cfg.dlq.starts_with("s3://") {
            violations.push(format!(
                "dlq path with s3:// scheme is not supported: {}",
                cfg.dlq
            ));
        }
        if cfg.dlq.trim().is_empty() {
            violations.push("dlq path cannot be blank".into());
        }
    }

    if !cfg.log_level.is_empty()
        && !KNOWN_LOG_LEVELS.contains(&cfg.log_level.to_lowercase().as_str())
    {
        violations.push(format!(
            "invalid log_level {:?}: must be debug, info, warn, or error",
            cfg.log_level
        ));
    }

    if !cfg.log_format.is_empty()
        && !KNOWN_LOG_FORMATS.contains(&cfg.log_format.to_lowercase().as_str())
    {
        violations.push(format!(
            "invalid log_format {:?}: must be json or text",
            cfg.log_format
        ));
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Validation { violations })
    }
}
