//! Sink construction from configuration

use std::fs::{self, File};
use std::path::Path;
use std::time::Duration;

use logsift_config::Config;
use tokio_util::sync::CancellationToken;

use crate::{HttpSink, JsonlSink, RotatingJsonlSink, Sink, SinkError};

#[cfg(test)]
#[path = "build_test.rs"]
mod tests;

/// Fallback rotation threshold when the config leaves it unset.
const DEFAULT_MAX_BYTES: u64 = 10 * 1024 * 1024;
/// Fallback retained-segment count when the config leaves it unset.
const DEFAULT_MAX_FILES: u64 = 5;

/// Construct the main sink selected by `output_type`.
pub fn build(cfg: &Config, cancel: CancellationToken) -> Result<Box<dyn Sink>, SinkError> {
    match cfg.output_type.to_lowercase().as_str() {
        "" | "stdout" => Ok(Box::new(JsonlSink::stdout())),
        "file" => {
            if cfg.output.is_empty() {
                return Err(SinkError::open("output path required for file sink"));
            }
            let file = File::create(&cfg.output).map_err(|e| SinkError::open(e.to_string()))?;
            Ok(Box::new(JsonlSink::new(Box::new(file))))
        }
        "rotate" | "rotating" => {
            if cfg.output.is_empty() {
                return Err(SinkError::open("output path required for rotating sink"));
            }
            let max_bytes = if cfg.output_max_bytes > 0 {
                cfg.output_max_bytes as u64
            } else {
                DEFAULT_MAX_BYTES
            };
            let max_files = if cfg.output_max_files > 0 {
                cfg.output_max_files as u64
            } else {
                DEFAULT_MAX_FILES
            };
            Ok(Box::new(RotatingJsonlSink::new(
                &cfg.output,
                max_bytes,
                max_files,
            )?))
        }
        "http" | "webhook" => {
            if cfg.output.is_empty() {
                return Err(SinkError::open("output URL required for http sink"));
            }
            // The pipeline's retry coordinator owns retries for the main
            // sink; the sink-level backoff would multiply attempts with it.
            let backoff_base = Duration::from_millis(cfg.sink_backoff_base_ms.max(0) as u64);
            Ok(Box::new(HttpSink::new(
                cfg.output.as_str(),
                0,
                backoff_base,
                cancel,
            )?))
        }
        "s3" | "kafka" => Err(SinkError::NotImplemented(cfg.output_type.clone())),
        _ => Err(SinkError::UnknownType(cfg.output_type.clone())),
    }
}

/// Open the dead-letter JSONL file, creating parent directories. Remote
/// `s3://` targets are explicitly unsupported.
pub fn open_dlq(path: &str) -> Result<Box<dyn Sink>, SinkError> {
    if path.starts_with("s3://") {
        return Err(SinkError::open(format!(
            "DLQ s3 target not supported in this build: {path}"
        )));
    }
    let path = Path::new(path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| SinkError::open(e.to_string()))?;
    }
    let file = File::create(path).map_err(|e| SinkError::open(e.to_string()))?;
    Ok(Box::new(JsonlSink::new(Box::new(file))))
}
