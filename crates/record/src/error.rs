//! Normalization error types

use thiserror::Error;

/// Errors produced while normalizing a raw record.
///
/// Validation order is timestamp (missing, then parse), message, level;
/// the first failure wins.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    /// No usable `ts`/`time` value was present.
    #[error("missing timestamp: expected ts/time in RFC3339")]
    MissingTimestamp,

    /// A timestamp was present but did not parse as RFC3339.
    #[error("invalid timestamp {0:?}: expected RFC3339")]
    InvalidTimestamp(String),

    /// No usable `msg`/`message` value was present.
    #[error("missing message: expected msg/message")]
    MissingMessage,

    /// No usable `level`/`severity` value was present.
    #[error("missing level: expected level/severity")]
    MissingLevel,
}
