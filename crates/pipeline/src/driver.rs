//! Pipeline driver
//!
//! Owns the producer loop and the sink worker pool. One call to
//! [`run_pipeline`] processes the whole input stream and writes the final
//! report on normal completion.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossfire::MAsyncRx;
use logsift_config::Config;
use logsift_record::{normalize, DlqEnvelope, NormalizedRecord, RawRecord};
use logsift_report::{Report, Stage};
use logsift_sinks::{BatchedSink, SharedSink, Sink};
use logsift_transform::{builtin_registry, Chain, Verdict};
use tokio::io::AsyncRead;
use tokio_stream::StreamExt;
use tokio_util::codec::{FramedRead, LinesCodec};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::retry::{write_with_retry, RetryPolicy};
use crate::{PipelineError, MAX_LINE_BYTES, MIN_QUEUE_SIZE};

/// Envelope carried through the bounded queue: one surviving record plus
/// its input line number for trace correlation.
struct WorkItem {
    record: NormalizedRecord,
    line: u64,
}

/// Fallback when `shutdown_timeout_seconds` is non-positive.
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Run the full pipeline over `input`.
///
/// The producer parses, normalizes, and transforms lines inline, feeding
/// surviving records to `max(max_workers, 1)` sink workers over a bounded
/// channel of capacity `max(queue_size, 128)`. On normal completion the
/// report duration is set and the report is written to its configured
/// path. Cancellation, scan failures, and shutdown timeouts surface as
/// errors after the sinks are closed.
pub async fn run_pipeline<R>(
    input: R,
    cfg: &Config,
    report: Arc<Report>,
    cancel: CancellationToken,
) -> Result<(), PipelineError>
where
    R: AsyncRead + Unpin,
{
    let worker_count = cfg.max_workers.max(1) as usize;
    let queue_size = cfg.queue_size.max(MIN_QUEUE_SIZE) as usize;
    info!(workers = worker_count, queue_size, "starting pipeline");

    let registry = builtin_registry();
    let chain = Chain::from_config(&registry, cfg)?;

    let base_sink = logsift_sinks::build(cfg, cancel.clone())?;
    let main_sink: Box<dyn Sink> = if cfg.batch_size > 1 {
        Box::new(BatchedSink::new(
            base_sink,
            cfg.batch_size as usize,
            Duration::from_millis(cfg.batch_flush_interval_ms.max(0) as u64),
        )?)
    } else {
        base_sink
    };
    let sink = SharedSink::new(main_sink);

    let dlq = if cfg.dlq.is_empty() {
        None
    } else {
        match logsift_sinks::open_dlq(&cfg.dlq) {
            Ok(dlq_sink) => Some(SharedSink::new(dlq_sink)),
            Err(err) => {
                close_sinks(&sink, None).await;
                return Err(err.into());
            }
        }
    };

    let start = Instant::now();
    let policy = RetryPolicy::from_config(cfg);
    let (tx, rx) = crossfire::mpmc::bounded_async::<WorkItem>(queue_size);

    let mut workers = Vec::with_capacity(worker_count);
    for worker_id in 0..worker_count {
        workers.push(tokio::spawn(worker_loop(
            worker_id,
            rx.clone(),
            sink.clone(),
            dlq.clone(),
            policy.clone(),
            Arc::clone(&report),
            cancel.clone(),
        )));
    }
    drop(rx);

    // Producer: parse, normalize, transform inline; enqueue survivors.
    let mut lines = FramedRead::new(input, LinesCodec::new_with_max_length(MAX_LINE_BYTES));
    let mut line_no: u64 = 0;
    let mut scan_error = None;

    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => {
                info!("shutdown signal received, finishing in-flight records");
                break;
            }
            next = lines.next() => match next {
                Some(Ok(line)) => line,
                Some(Err(err)) => {
                    scan_error = Some(PipelineError::Scan(err.to_string()));
                    break;
                }
                None => break,
            },
        };

        if line.trim().is_empty() {
            continue;
        }
        line_no += 1;
        report.add_line();
        let trace_id = format!("line-{line_no}");

        let parse_start = Instant::now();
        let parsed: Result<RawRecord, _> = serde_json::from_str(&line);
        report.add_stage_timing(Stage::Parsing, parse_start.elapsed());
        let raw = match parsed {
            Ok(raw) => raw,
            Err(err) => {
                report.add_json_failed();
                debug!(trace_id = %trace_id, error = %err, "JSON parse failed");
                continue;
            }
        };
        report.add_json_parsed();

        let norm_start = Instant::now();
        let normalized = normalize(&raw);
        report.add_stage_timing(Stage::Normalization, norm_start.elapsed());
        let record = match normalized {
            Ok(record) => record,
            Err(err) => {
                report.add_normalized_failed();
                warn!(trace_id = %trace_id, error = %err, "normalization failed");
                continue;
            }
        };
        report.add_normalized_ok();
        report.add_level(&record.level);
        report.add_service(&record.service);

        let filter_start = Instant::now();
        let verdict = chain.apply(record);
        report.add_stage_timing(Stage::Filtering, filter_start.elapsed());
        let record = match verdict {
            Ok(Verdict::Keep(record)) => record,
            Ok(Verdict::Drop { reason }) => {
                report.add_filtered(&reason);
                continue;
            }
            Err(err) => {
                report.add_normalized_failed();
                warn!(trace_id = %trace_id, error = %err, "transform error");
                continue;
            }
        };

        let item = WorkItem {
            record,
            line: line_no,
        };
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("shutdown signal received, finishing in-flight records");
                break;
            }
            sent = tx.send(item) => {
                if sent.is_err() {
                    // All workers gone; nothing left to feed.
                    break;
                }
            }
        }
    }

    // Closing the sender ends the stream once workers drain it.
    drop(tx);
    info!("input exhausted, waiting for workers to finish");

    let shutdown_timeout = if cfg.shutdown_timeout_seconds > 0 {
        Duration::from_secs(cfg.shutdown_timeout_seconds as u64)
    } else {
        DEFAULT_SHUTDOWN_TIMEOUT
    };

    let drain = async {
        for worker in workers {
            let _ = worker.await;
        }
    };
    let timed_out = tokio::select! {
        _ = drain => false,
        _ = tokio::time::sleep(shutdown_timeout) => true,
    };

    close_sinks(&sink, dlq.as_ref()).await;

    if timed_out {
        warn!(timeout_secs = shutdown_timeout.as_secs(), "shutdown timeout exceeded, some records may not have been processed");
        return Err(PipelineError::ShutdownTimeout(shutdown_timeout));
    }
    if let Some(err) = scan_error {
        return Err(err);
    }
    if cancel.is_cancelled() {
        return Err(PipelineError::Cancelled);
    }

    report.set_duration(start.elapsed());
    {
        let snapshot = report.snapshot();
        info!(
            duration_seconds = snapshot.duration_seconds,
            throughput = snapshot.throughput_lines_per_sec,
            "pipeline completed"
        );
    }
    report.write_json(&cfg.report)?;

    Ok(())
}

/// One sink worker: receive until the channel closes or cancellation
/// fires, writing each record through the retry coordinator.
async fn worker_loop(
    worker_id: usize,
    rx: MAsyncRx<WorkItem>,
    sink: SharedSink,
    dlq: Option<SharedSink>,
    policy: RetryPolicy,
    report: Arc<Report>,
    cancel: CancellationToken,
) {
    loop {
        let item = tokio::select! {
            _ = cancel.cancelled() => {
                debug!(worker_id, "worker shutting down");
                return;
            }
            received = rx.recv() => match received {
                Ok(item) => item,
                Err(_) => return,
            },
        };

        let trace_id = format!("line-{}", item.line);
        let value = match serde_json::to_value(&item.record) {
            Ok(value) => value,
            Err(err) => {
                report.add_write_failed();
                warn!(trace_id = %trace_id, error = %err, "record serialization failed");
                continue;
            }
        };

        let write_start = Instant::now();
        let (retries, outcome) =
            write_with_retry(&sink, &value, &policy, &report, &cancel).await;
        report.add_stage_timing(Stage::Writing, write_start.elapsed());

        match outcome {
            Ok(()) => {
                report.add_write_ok();
                if retries > 0 {
                    debug!(trace_id = %trace_id, retries, "write succeeded after retries");
                }
            }
            Err(err) => {
                report.add_write_failed();
                warn!(trace_id = %trace_id, error = %err, retries, "write failed");
                if let Some(dlq) = &dlq {
                    let reason = err.to_string();
                    write_dlq(dlq, item.record, &reason).await;
                    report.add_dlq(&reason);
                }
            }
        }
    }
}

/// Best-effort DLQ write; failures are logged and never propagate.
async fn write_dlq(dlq: &SharedSink, record: NormalizedRecord, reason: &str) {
    let envelope = DlqEnvelope::new(record, reason);
    match serde_json::to_value(&envelope) {
        Ok(value) => {
            if let Err(err) = dlq.write(&value).await {
                error!(error = %err, "failed to write to DLQ");
            }
        }
        Err(err) => error!(error = %err, "failed to serialize DLQ envelope"),
    }
}

/// Close the main sink and DLQ, logging failures. Runs on every exit path.
async fn close_sinks(sink: &SharedSink, dlq: Option<&SharedSink>) {
    if let Err(err) = sink.close().await {
        error!(error = %err, "error closing sink");
    }
    if let Some(dlq) = dlq {
        if let Err(err) = dlq.close().await {
            error!(error = %err, "error closing DLQ");
        }
    }
}
