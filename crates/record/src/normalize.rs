//! Raw-object → canonical-record normalization
//!
//! Pure function, no I/O. Alias priority:
//!
//! | Canonical | Primary | Fallback(s) |
//! |-----------|---------|-------------|
//! | ts        | `ts`    | `time` |
//! | level     | `level` | `severity` |
//! | message   | `msg`   | `message` |
//! | service   | `service` | `app`, `component` |
//! | namespace | `kubernetes.namespace_name` | top-level `namespace` (overrides) |
//! | pod       | `kubernetes.pod_name` | top-level `pod` (overrides) |
//! | node      | `kubernetes.node_name` | top-level `node`, `hostname` |
//! | trace_id  | `trace_id` | `trace` |
//!
//! Only string-typed values are accepted; everything else is treated as
//! absent. All accepted strings are trimmed. Source keys outside the
//! consumed alias set pass through into `fields` untouched.

use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde_json::Value;

use crate::{NormalizeError, NormalizedRecord, RawRecord};

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;

/// Source keys consumed into canonical columns. Anything else flows into
/// `fields` verbatim.
const CONSUMED_KEYS: &[&str] = &[
    "ts",
    "time",
    "level",
    "severity",
    "msg",
    "message",
    "service",
    "app",
    "component",
    "kubernetes",
    "namespace",
    "pod",
    "node",
    "hostname",
    "trace_id",
    "trace",
];

/// Normalize one decoded log object into the canonical record shape.
pub fn normalize(raw: &RawRecord) -> Result<NormalizedRecord, NormalizeError> {
    let mut rec = NormalizedRecord {
        ts: first_string(raw, &["ts", "time"]),
        level: first_string(raw, &["level", "severity"]),
        message: first_string(raw, &["msg", "message"]),
        service: first_string(raw, &["service", "app", "component"]),
        trace_id: first_string(raw, &["trace_id", "trace"]),
        ..NormalizedRecord::default()
    };

    // Nested kubernetes metadata first; top-level keys override it.
    if let Some(Value::Object(k8s)) = raw.get("kubernetes") {
        rec.namespace = string_value(k8s.get("namespace_name"));
        rec.pod = string_value(k8s.get("pod_name"));
        rec.node = string_value(k8s.get("node_name"));
    }
    if let Some(v @ Value::String(_)) = raw.get("namespace") {
        rec.namespace = string_value(Some(v));
    }
    if let Some(v @ Value::String(_)) = raw.get("pod") {
        rec.pod = string_value(Some(v));
    }
    if let Some(v @ Value::String(_)) = raw.get("node") {
        rec.node = string_value(Some(v));
    }
    if rec.node.is_empty() {
        if let Some(v) = raw.get("hostname") {
            rec.node = string_value(Some(v));
        }
    }

    for (key, value) in raw {
        if !CONSUMED_KEYS.contains(&key.as_str()) {
            rec.fields.insert(key.clone(), value.clone());
        }
    }

    rec.ts = reformat_timestamp(&rec.ts)?;
    if rec.message.is_empty() {
        return Err(NormalizeError::MissingMessage);
    }
    if rec.level.is_empty() {
        return Err(NormalizeError::MissingLevel);
    }
    rec.level = rec.level.to_uppercase();

    Ok(rec)
}

/// First alias whose value is a string with non-empty trimmed content.
fn first_string(raw: &RawRecord, aliases: &[&str]) -> String {
    for alias in aliases {
        if let Some(Value::String(s)) = raw.get(*alias) {
            let trimmed = s.trim();
            if !trimmed.is_empty() {
                return trimmed.to_string();
            }
        }
    }
    String::new()
}

fn string_value(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        _ => String::new(),
    }
}

/// Parse RFC3339 (fractional seconds allowed) and re-serialize with the
/// fraction trimmed of trailing zeros. A zero offset renders as `Z`.
fn reformat_timestamp(ts: &str) -> Result<String, NormalizeError> {
    if ts.is_empty() {
        return Err(NormalizeError::MissingTimestamp);
    }
    let parsed: DateTime<FixedOffset> = DateTime::parse_from_rfc3339(ts)
        .map_err(|_| NormalizeError::InvalidTimestamp(ts.to_string()))?;
    Ok(trim_fraction(
        parsed.to_rfc3339_opts(SecondsFormat::Nanos, true),
    ))
}

/// Drop trailing zeros from the fractional-second component, removing the
/// fraction entirely when it is all zeros.
fn trim_fraction(formatted: String) -> String {
    let Some(dot) = formatted.find('.') else {
        return formatted;
    };
    let suffix_at = formatted[dot..]
        .find(|c| c == 'Z' || c == '+' || c == '-')
        .map(|i| dot + i)
        .unwrap_or(formatted.len());
    let fraction = formatted[dot + 1..suffix_at].trim_end_matches('0');
    if fraction.is_empty() {
        format!("{}{}", &formatted[..dot], &formatted[suffix_at..])
    } else {
        format!(
            "{}.{}{}",
            &formatted[..dot],
            fraction,
            &formatted[suffix_at..]
        )
    }
}
