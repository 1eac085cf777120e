//! Run summary printed to stdout on success

use logsift_report::ReportSnapshot;

/// Render the human summary: totals always, stage timings when any are
/// non-zero, retry stats when retries happened, DLQ count with reason
/// breakdown when non-zero.
pub fn render(snapshot: &ReportSnapshot) -> String {
    let mut out = format!(
        "Total Lines: {}, JSON Parsed: {}, JSON Failed: {}, Normalized OK: {}, Normalized Failed: {}, Written OK: {}\n",
        snapshot.total_lines,
        snapshot.json_parsed,
        snapshot.json_failed,
        snapshot.normalized_ok,
        snapshot.normalized_failed,
        snapshot.written_ok,
    );

    if snapshot.stage_timings.any_nonzero() {
        out.push_str(&format!(
            "Stage Timings (seconds): Parsing: {:.3}, Normalization: {:.3}, Filtering: {:.3}, Writing: {:.3}\n",
            snapshot.stage_timings.parsing_seconds,
            snapshot.stage_timings.normalization_seconds,
            snapshot.stage_timings.filtering_seconds,
            snapshot.stage_timings.writing_seconds,
        ));
    }

    if snapshot.retry_stats.total_retries > 0 {
        out.push_str(&format!(
            "Retry Stats: Total Retries: {}, Writes with Retries: {}, Max Retries per Write: {}\n",
            snapshot.retry_stats.total_retries,
            snapshot.retry_stats.writes_with_retries,
            snapshot.retry_stats.max_retries_per_write,
        ));
    }

    if snapshot.dlq_written > 0 {
        out.push_str(&format!("DLQ Written: {}", snapshot.dlq_written));
        if !snapshot.dlq_reasons.is_empty() {
            let reasons: Vec<String> = snapshot
                .dlq_reasons
                .iter()
                .map(|(reason, count)| format!("{reason}={count}"))
                .collect();
            out.push_str(&format!(" (Reasons: {})", reasons.join(", ")));
        }
        out.push('\n');
    }

    out
}
