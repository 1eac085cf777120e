//! Prometheus text exposition of the report
//!
//! Every report scalar becomes an `etl_*` counter or gauge; the per-key
//! maps become labeled families.

use std::fmt::Write;

use crate::ReportSnapshot;

pub fn render(snapshot: &ReportSnapshot) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail; discard the fmt results.
    let _ = writeln!(out, "etl_total_lines {}", snapshot.total_lines);
    let _ = writeln!(out, "etl_json_failed {}", snapshot.json_failed);
    let _ = writeln!(out, "etl_json_parsed {}", snapshot.json_parsed);
    let _ = writeln!(out, "etl_normalized_ok {}", snapshot.normalized_ok);
    let _ = writeln!(out, "etl_normalized_failed {}", snapshot.normalized_failed);
    let _ = writeln!(out, "etl_written_ok {}", snapshot.written_ok);
    let _ = writeln!(out, "etl_written_failed {}", snapshot.written_failed);
    let _ = writeln!(out, "etl_dlq_written {}", snapshot.dlq_written);
    let _ = writeln!(out, "etl_duration_seconds {:.6}", snapshot.duration_seconds);
    let _ = writeln!(
        out,
        "etl_throughput_lines_per_sec {:.6}",
        snapshot.throughput_lines_per_sec
    );
    let _ = writeln!(out, "etl_json_error_rate {:.6}", snapshot.json_error_rate);
    let _ = writeln!(
        out,
        "etl_normalize_error_rate {:.6}",
        snapshot.normalize_error_rate
    );
    let _ = writeln!(out, "etl_write_error_rate {:.6}", snapshot.write_error_rate);
    let _ = writeln!(out, "etl_filtered_level {}", snapshot.filtered.by_level);
    let _ = writeln!(out, "etl_filtered_service {}", snapshot.filtered.by_service);
    let _ = writeln!(out, "etl_filtered_other {}", snapshot.filtered.other);

    for (level, count) in &snapshot.by_level {
        let _ = writeln!(out, "etl_level_total{{level={level:?}}} {count}");
    }
    for (service, count) in &snapshot.by_service {
        let _ = writeln!(out, "etl_service_total{{service={service:?}}} {count}");
    }

    let stages = [
        ("parsing", snapshot.stage_timings.parsing_seconds),
        ("normalization", snapshot.stage_timings.normalization_seconds),
        ("filtering", snapshot.stage_timings.filtering_seconds),
        ("writing", snapshot.stage_timings.writing_seconds),
    ];
    for (stage, seconds) in stages {
        let _ = writeln!(out, "etl_stage_timing_seconds{{stage=\"{stage}\"}} {seconds:.6}");
    }

    let _ = writeln!(out, "etl_retry_total {}", snapshot.retry_stats.total_retries);
    let _ = writeln!(
        out,
        "etl_retry_writes_with_retries {}",
        snapshot.retry_stats.writes_with_retries
    );
    let _ = writeln!(
        out,
        "etl_retry_max_per_write {}",
        snapshot.retry_stats.max_retries_per_write
    );
    for (reason, count) in &snapshot.dlq_reasons {
        let _ = writeln!(out, "etl_dlq_reason_total{{reason={reason:?}}} {count}");
    }

    out
}
