//! logsift - Report
//!
//! Thread-safe accumulator for pipeline statistics: counters, per-key
//! tallies, filter and DLQ breakdowns, retry stats, per-stage timings, and
//! the derived rates computed when the run finishes.
//!
//! The producer and every sink worker share one [`Report`]; all mutation
//! goes through its methods, which take the internal mutex. The final
//! snapshot serializes to JSON (stable field names) and to Prometheus
//! text via [`Report::prometheus`].

mod prometheus;

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from report serialization
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("write report: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Pipeline stages with accumulated wall-clock timings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Parsing,
    Normalization,
    Filtering,
    Writing,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Parsing => "parsing",
            Stage::Normalization => "normalization",
            Stage::Filtering => "filtering",
            Stage::Writing => "writing",
        }
    }
}

/// Filter drop counts keyed by reason class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterStats {
    pub by_level: u64,
    pub by_service: u64,
    pub other: u64,
}

impl FilterStats {
    pub fn total(&self) -> u64 {
        self.by_level + self.by_service + self.other
    }
}

/// Accumulated seconds spent per pipeline stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StageTimings {
    pub parsing_seconds: f64,
    pub normalization_seconds: f64,
    pub filtering_seconds: f64,
    pub writing_seconds: f64,
}

impl StageTimings {
    pub fn any_nonzero(&self) -> bool {
        self.parsing_seconds > 0.0
            || self.normalization_seconds > 0.0
            || self.filtering_seconds > 0.0
            || self.writing_seconds > 0.0
    }
}

/// Sink write retry statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryStats {
    pub total_retries: u64,
    pub writes_with_retries: u64,
    pub max_retries_per_write: u64,
}

/// Point-in-time snapshot of the report. This is the serialized shape;
/// field names are a stable contract.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportSnapshot {
    pub total_lines: u64,
    pub json_parsed: u64,
    pub json_failed: u64,
    pub normalized_ok: u64,
    pub normalized_failed: u64,
    pub written_ok: u64,
    pub written_failed: u64,
    pub by_level: BTreeMap<String, u64>,
    pub by_service: BTreeMap<String, u64>,
    pub filtered: FilterStats,
    pub dlq_written: u64,
    pub dlq_reasons: BTreeMap<String, u64>,
    pub duration_seconds: f64,
    pub throughput_lines_per_sec: f64,
    pub json_error_rate: f64,
    pub normalize_error_rate: f64,
    pub write_error_rate: f64,
    pub stage_timings: StageTimings,
    pub retry_stats: RetryStats,
}

/// Thread-safe report accumulator shared across the pipeline.
#[derive(Debug, Default)]
pub struct Report {
    inner: Mutex<ReportSnapshot>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_line(&self) {
        self.inner.lock().total_lines += 1;
    }

    pub fn add_json_parsed(&self) {
        self.inner.lock().json_parsed += 1;
    }

    pub fn add_json_failed(&self) {
        self.inner.lock().json_failed += 1;
    }

    pub fn add_normalized_ok(&self) {
        self.inner.lock().normalized_ok += 1;
    }

    pub fn add_normalized_failed(&self) {
        self.inner.lock().normalized_failed += 1;
    }

    /// Tally a record's level. Empty keys are skipped.
    pub fn add_level(&self, level: &str) {
        if level.is_empty() {
            return;
        }
        *self.inner.lock().by_level.entry(level.to_string()).or_default() += 1;
    }

    /// Tally a record's service. Empty keys are skipped.
    pub fn add_service(&self, service: &str) {
        if service.is_empty() {
            return;
        }
        *self
            .inner
            .lock()
            .by_service
            .entry(service.to_string())
            .or_default() += 1;
    }

    /// Register a filtered drop. Reasons other than `level`/`service`
    /// collapse into `other`.
    pub fn add_filtered(&self, reason: &str) {
        let mut inner = self.inner.lock();
        match reason {
            "level" => inner.filtered.by_level += 1,
            "service" => inner.filtered.by_service += 1,
            _ => inner.filtered.other += 1,
        }
    }

    pub fn add_write_ok(&self) {
        self.inner.lock().written_ok += 1;
    }

    pub fn add_write_failed(&self) {
        self.inner.lock().written_failed += 1;
    }

    /// Register a DLQ write. An empty reason becomes `"unknown"`.
    pub fn add_dlq(&self, reason: &str) {
        let reason = if reason.is_empty() { "unknown" } else { reason };
        let mut inner = self.inner.lock();
        inner.dlq_written += 1;
        *inner.dlq_reasons.entry(reason.to_string()).or_default() += 1;
    }

    /// Register `retries` retry attempts for one write. Counts a single
    /// `writes_with_retries` increment and tracks the per-write maximum.
    pub fn add_retries(&self, retries: u64) {
        let mut inner = self.inner.lock();
        inner.retry_stats.total_retries += retries;
        if retries > 0 {
            inner.retry_stats.writes_with_retries += 1;
            if retries > inner.retry_stats.max_retries_per_write {
                inner.retry_stats.max_retries_per_write = retries;
            }
        }
    }

    /// Accumulate wall-clock time into a stage bucket.
    pub fn add_stage_timing(&self, stage: Stage, duration: Duration) {
        let seconds = duration.as_secs_f64();
        let mut inner = self.inner.lock();
        match stage {
            Stage::Parsing => inner.stage_timings.parsing_seconds += seconds,
            Stage::Normalization => inner.stage_timings.normalization_seconds += seconds,
            Stage::Filtering => inner.stage_timings.filtering_seconds += seconds,
            Stage::Writing => inner.stage_timings.writing_seconds += seconds,
        }
    }

    /// Set the run duration and compute the derived rates. A non-positive
    /// duration with lines processed is clamped to one nanosecond so the
    /// throughput stays finite.
    pub fn set_duration(&self, duration: Duration) {
        let mut inner = self.inner.lock();
        let mut duration = duration;
        if duration.is_zero() && inner.total_lines > 0 {
            duration = Duration::from_nanos(1);
        }
        let seconds = duration.as_secs_f64();
        inner.duration_seconds = seconds;
        if seconds > 0.0 {
            inner.throughput_lines_per_sec = inner.total_lines as f64 / seconds;
        }
        if inner.total_lines > 0 {
            inner.json_error_rate = inner.json_failed as f64 / inner.total_lines as f64;
            inner.normalize_error_rate =
                inner.normalized_failed as f64 / inner.total_lines as f64;
            let writes = inner.written_ok + inner.written_failed;
            if writes > 0 {
                inner.write_error_rate = inner.written_failed as f64 / writes as f64;
            }
        }
    }

    /// Clone the current state.
    pub fn snapshot(&self) -> ReportSnapshot {
        self.inner.lock().clone()
    }

    /// Serialize as pretty JSON to `path`, or to stdout when the path is
    /// empty or `-`.
    pub fn write_json(&self, path: &str) -> Result<(), ReportError> {
        let snapshot = self.snapshot();
        let mut json = serde_json::to_vec_pretty(&snapshot)?;
        json.push(b'\n');

        if path.is_empty() || path == "-" {
            std::io::stdout().write_all(&json)?;
        } else {
            File::create(Path::new(path))?.write_all(&json)?;
        }
        Ok(())
    }

    /// Render the Prometheus text exposition of the current state.
    pub fn prometheus(&self) -> String {
        prometheus::render(&self.snapshot())
    }
}

#[cfg(test)]
#[path = "report_test.rs"]
mod tests;
