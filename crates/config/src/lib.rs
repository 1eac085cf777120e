//! logsift Configuration
//!
//! Runtime options for the ETL pipeline, layered from four sources with
//! increasing precedence: built-in defaults, a config file (YAML or JSON by
//! extension), `LOGSIFT_*` environment variables, and CLI flags. The binary
//! wires the layering; this crate provides the pieces.
//!
//! # Example minimal config
//!
//! ```yaml
//! input: logs/k8s.jsonl
//! output_type: file
//! output: out/normalized.jsonl
//! filter_levels:
//!   - WARN
//!   - ERROR
//! redact_keys:
//!   - user_email
//!   - token
//! ```

mod error;
mod validation;

pub use error::{ConfigError, Result};

use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// ETL runtime options. Zero/empty values mean "not set" and lose to the
/// layer below during [`Config::merge`]; validation runs on the final
/// merged value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default = "Config::empty")]
pub struct Config {
    /// Input JSONL path; empty or `-` reads stdin.
    pub input: String,
    /// Output path (file/rotate) or URL (http); `-` means stdout.
    pub output: String,
    /// Sink type: stdout | file | rotate | http | webhook.
    pub output_type: String,
    pub output_max_bytes: i64,
    pub output_max_files: i64,
    /// Report output path; empty or `-` writes stdout.
    pub report: String,
    pub filter_levels: Vec<String>,
    pub filter_services: Vec<String>,
    pub redact_keys: Vec<String>,
    pub transforms: Vec<String>,
    pub max_workers: i64,
    pub queue_size: i64,
    pub sink_max_retries: i64,
    pub sink_backoff_base_ms: i64,
    pub sink_backoff_max_ms: i64,
    pub sink_backoff_jitter_pct: f64,
    /// Dead-letter JSONL path; empty disables the DLQ.
    pub dlq: String,
    pub batch_size: i64,
    pub batch_flush_interval_ms: i64,
    pub shutdown_timeout_seconds: i64,
    /// debug | info | warn | error
    pub log_level: String,
    /// json | text
    pub log_format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: String::new(),
            output: String::new(),
            output_type: "stdout".into(),
            output_max_bytes: 10 * 1024 * 1024,
            output_max_files: 5,
            report: "report.json".into(),
            filter_levels: vec!["WARN".into(), "ERROR".into()],
            filter_services: Vec::new(),
            redact_keys: Vec::new(),
            transforms: vec!["filter_redact".into()],
            max_workers: 4,
            queue_size: 128,
            sink_max_retries: 3,
            sink_backoff_base_ms: 100,
            sink_backoff_max_ms: 2000,
            sink_backoff_jitter_pct: 0.2,
            dlq: String::new(),
            batch_size: 100,
            batch_flush_interval_ms: 1000,
            shutdown_timeout_seconds: 30,
            log_level: "info".into(),
            log_format: "json".into(),
        }
    }
}

impl Config {
    /// A config with every field unset. Used as the serde fill-in so that
    /// keys absent from a file stay "unset" and lose to lower layers.
    pub fn empty() -> Self {
        Self {
            input: String::new(),
            output: String::new(),
            output_type: String::new(),
            output_max_bytes: 0,
            output_max_files: 0,
            report: String::new(),
            filter_levels: Vec::new(),
            filter_services: Vec::new(),
            redact_keys: Vec::new(),
            transforms: Vec::new(),
            max_workers: 0,
            queue_size: 0,
            sink_max_retries: 0,
            sink_backoff_base_ms: 0,
            sink_backoff_max_ms: 0,
            sink_backoff_jitter_pct: 0.0,
            dlq: String::new(),
            batch_size: 0,
            batch_flush_interval_ms: 0,
            shutdown_timeout_seconds: 0,
            log_level: String::new(),
            log_format: String::new(),
        }
    }

    /// Load a config file, YAML (`.yaml`/`.yml`) or JSON by extension.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        match ext.as_str() {
            "yaml" | "yml" => {
                serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })
            }
            _ => serde_json::from_str(&contents).map_err(|e| ConfigError::Parse {
                path: path.display().to_string(),
                message: e.to_string(),
            }),
        }
    }

    /// Overlay set values from `overlay` onto `self`, returning the result.
    /// Strings and lists win when non-empty, numerics when non-zero.
    pub fn merge(mut self, overlay: Config) -> Config {
        fn take_str(dst: &mut String, src: String) {
            if !src.is_empty() {
                *dst = src;
            }
        }
        fn take_list(dst: &mut Vec<String>, src: Vec<String>) {
            if !src.is_empty() {
                *dst = src;
            }
        }
        fn take_num(dst: &mut i64, src: i64) {
            if src != 0 {
                *dst = src;
            }
        }

        take_str(&mut self.input, overlay.input);
        take_str(&mut self.output, overlay.output);
        take_str(&mut self.output_type, overlay.output_type);
        take_num(&mut self.output_max_bytes, overlay.output_max_bytes);
        take_num(&mut self.output_max_files, overlay.output_max_files);
        take_str(&mut self.report, overlay.report);
        take_list(&mut self.filter_levels, overlay.filter_levels);
        take_list(&mut self.filter_services, overlay.filter_services);
        take_list(&mut self.redact_keys, overlay.redact_keys);
        take_list(&mut self.transforms, overlay.transforms);
        take_num(&mut self.max_workers, overlay.max_workers);
        take_num(&mut self.queue_size, overlay.queue_size);
        take_num(&mut self.sink_max_retries, overlay.sink_max_retries);
        take_num(&mut self.sink_backoff_base_ms, overlay.sink_backoff_base_ms);
        take_num(&mut self.sink_backoff_max_ms, overlay.sink_backoff_max_ms);
        if overlay.sink_backoff_jitter_pct != 0.0 {
            self.sink_backoff_jitter_pct = overlay.sink_backoff_jitter_pct;
        }
        take_str(&mut self.dlq, overlay.dlq);
        take_num(&mut self.batch_size, overlay.batch_size);
        take_num(
            &mut self.batch_flush_interval_ms,
            overlay.batch_flush_interval_ms,
        );
        take_num(
            &mut self.shutdown_timeout_seconds,
            overlay.shutdown_timeout_seconds,
        );
        take_str(&mut self.log_level, overlay.log_level);
        take_str(&mut self.log_format, overlay.log_format);

        self
    }

    /// Apply `LOGSIFT_*` environment overrides on top of `self`.
    /// Unparsable numeric values are ignored.
    pub fn apply_env(mut self) -> Config {
        fn env_str(key: &str, dst: &mut String) {
            if let Ok(v) = env::var(key) {
                if !v.is_empty() {
                    *dst = v;
                }
            }
        }
        fn env_num(key: &str, dst: &mut i64) {
            if let Ok(v) = env::var(key) {
                if let Ok(parsed) = v.trim().parse() {
                    *dst = parsed;
                }
            }
        }
        fn env_list(key: &str, dst: &mut Vec<String>) {
            if let Ok(v) = env::var(key) {
                let parsed = parse_list(&v);
                if !parsed.is_empty() {
                    *dst = parsed;
                }
            }
        }

        env_str("LOGSIFT_INPUT", &mut self.input);
        env_str("LOGSIFT_OUTPUT", &mut self.output);
        env_str("LOGSIFT_OUTPUT_TYPE", &mut self.output_type);
        env_num("LOGSIFT_OUTPUT_MAX_BYTES", &mut self.output_max_bytes);
        env_num("LOGSIFT_OUTPUT_MAX_FILES", &mut self.output_max_files);
        env_str("LOGSIFT_REPORT", &mut self.report);
        env_list("LOGSIFT_FILTER_LEVELS", &mut self.filter_levels);
        env_list("LOGSIFT_FILTER_SERVICES", &mut self.filter_services);
        env_list("LOGSIFT_REDACT_KEYS", &mut self.redact_keys);
        env_list("LOGSIFT_TRANSFORMS", &mut self.transforms);
        env_num("LOGSIFT_MAX_WORKERS", &mut self.max_workers);
        env_num("LOGSIFT_QUEUE_SIZE", &mut self.queue_size);
        env_num("LOGSIFT_SINK_MAX_RETRIES", &mut self.sink_max_retries);
        env_num(
            "LOGSIFT_SINK_BACKOFF_BASE_MS",
            &mut self.sink_backoff_base_ms,
        );
        env_num("LOGSIFT_SINK_BACKOFF_MAX_MS", &mut self.sink_backoff_max_ms);
        if let Ok(v) = env::var("LOGSIFT_SINK_BACKOFF_JITTER_PCT") {
            if let Ok(parsed) = v.trim().parse() {
                self.sink_backoff_jitter_pct = parsed;
            }
        }
        env_str("LOGSIFT_DLQ", &mut self.dlq);
        env_num("LOGSIFT_BATCH_SIZE", &mut self.batch_size);
        env_num(
            "LOGSIFT_BATCH_FLUSH_INTERVAL_MS",
            &mut self.batch_flush_interval_ms,
        );
        env_num(
            "LOGSIFT_SHUTDOWN_TIMEOUT_SECONDS",
            &mut self.shutdown_timeout_seconds,
        );
        env_str("LOGSIFT_LOG_LEVEL", &mut self.log_level);
        env_str("LOGSIFT_LOG_FORMAT", &mut self.log_format);

        self
    }

    /// Validate the merged configuration, collecting every violation into a
    /// single [`ConfigError::Validation`].
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }
}

/// Split a comma/semicolon-separated list, trimming and dropping blanks.
pub fn parse_list(s: &str) -> Vec<String> {
    s.split([',', ';'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
