//! logsift - Record
//!
//! The canonical record model shared by every pipeline stage.
//!
//! # Overview
//!
//! Raw input lines are arbitrary JSON objects. The [`normalize`] function
//! maps one decoded object into a [`NormalizedRecord`]: aliases resolved,
//! required fields validated, timestamp re-serialized, level uppercased,
//! and everything unconsumed preserved under `fields`.
//!
//! ```text
//! {"time":"...","severity":"warn",...}  →  NormalizedRecord { ts, level: "WARN", ... }
//! ```

mod error;
mod normalize;

pub use error::NormalizeError;
pub use normalize::normalize;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A raw decoded log line: string keys, arbitrary JSON values.
pub type RawRecord = serde_json::Map<String, Value>;

/// Canonical normalized log entry.
///
/// `ts`, `level` and `message` are always non-empty after normalization;
/// the remaining columns may be empty strings when the source carried no
/// usable value. `fields` holds every source key that was not consumed
/// into a canonical column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    /// RFC3339 timestamp, fractional seconds preserved when present.
    pub ts: String,
    /// Uppercased severity.
    pub level: String,
    pub service: String,
    pub namespace: String,
    pub pod: String,
    pub node: String,
    pub message: String,
    pub trace_id: String,
    /// Passthrough fields. Insertion order is not part of the contract.
    pub fields: serde_json::Map<String, Value>,
}

/// Envelope written to the dead-letter sink when write retries exhaust.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DlqEnvelope {
    pub record: NormalizedRecord,
    pub reason: String,
}

impl DlqEnvelope {
    pub fn new(record: NormalizedRecord, reason: impl Into<String>) -> Self {
        Self {
            record,
            reason: reason.into(),
        }
    }
}
