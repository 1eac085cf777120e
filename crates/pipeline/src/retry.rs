//! Retry coordinator
//!
//! Wraps sink writes in bounded exponential backoff with uniform jitter.
//! Cancellation is honored before every attempt and during every wait.

use std::time::Duration;

use logsift_config::Config;
use logsift_report::Report;
use logsift_sinks::SharedSink;
use rand::Rng;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::PipelineError;

#[cfg(test)]
#[path = "retry_test.rs"]
mod tests;

const DEFAULT_BASE: Duration = Duration::from_millis(100);
const DEFAULT_MAX: Duration = Duration::from_secs(2);
const DEFAULT_JITTER_PCT: f64 = 0.2;

/// Backoff parameters for sink writes.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Extra attempts after the first try.
    pub max_retries: u32,
    /// First backoff step.
    pub base: Duration,
    /// Backoff ceiling.
    pub max: Duration,
    /// Uniform jitter fraction added on top of each step, in `[0, 1]`.
    pub jitter_pct: f64,
}

impl RetryPolicy {
    /// Build from config, substituting defaults for non-positive values
    /// and clamping negative retry counts to zero.
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            max_retries: cfg.sink_max_retries.max(0) as u32,
            base: if cfg.sink_backoff_base_ms > 0 {
                Duration::from_millis(cfg.sink_backoff_base_ms as u64)
            } else {
                DEFAULT_BASE
            },
            max: if cfg.sink_backoff_max_ms > 0 {
                Duration::from_millis(cfg.sink_backoff_max_ms as u64)
            } else {
                DEFAULT_MAX
            },
            jitter_pct: if cfg.sink_backoff_jitter_pct > 0.0 {
                cfg.sink_backoff_jitter_pct
            } else {
                DEFAULT_JITTER_PCT
            },
        }
    }

    /// `min(base * 2^attempt, max)`, without jitter.
    fn backoff(&self, attempt: u32) -> Duration {
        let stepped = self.base * 2u32.saturating_pow(attempt);
        stepped.min(self.max)
    }
}

/// Write `record` through `sink`, retrying per `policy`.
///
/// Returns the number of retries performed alongside the outcome. Retries
/// are registered on the report exactly once, whether the write finally
/// succeeded or exhausted its attempts; a cancelled write returns the
/// counter accumulated so far without registering it.
pub async fn write_with_retry(
    sink: &SharedSink,
    record: &Value,
    policy: &RetryPolicy,
    report: &Report,
    cancel: &CancellationToken,
) -> (u64, Result<(), PipelineError>) {
    let mut retries: u64 = 0;
    let mut last_err = None;

    for attempt in 0..=policy.max_retries {
        if cancel.is_cancelled() {
            return (retries, Err(PipelineError::Cancelled));
        }

        match sink.write(record).await {
            Ok(()) => {
                if retries > 0 {
                    report.add_retries(retries);
                }
                return (retries, Ok(()));
            }
            Err(err) => last_err = Some(err),
        }

        if attempt == policy.max_retries {
            break;
        }

        retries += 1;
        let step = policy.backoff(attempt);
        let jitter = step.mul_f64(rand::thread_rng().gen::<f64>() * policy.jitter_pct);
        tokio::select! {
            _ = cancel.cancelled() => return (retries, Err(PipelineError::Cancelled)),
            _ = tokio::time::sleep(step + jitter) => {}
        }
    }

    if retries > 0 {
        report.add_retries(retries);
    }
    let err = last_err
        .map(PipelineError::from)
        .unwrap_or(PipelineError::Cancelled);
    (retries, Err(err))
}
