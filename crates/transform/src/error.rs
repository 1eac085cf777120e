//! Transform error types

use thiserror::Error;

/// Errors that can occur while building or applying transforms
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransformError {
    /// Invalid configuration (unknown transform name, bad options).
    /// Fatal at startup.
    #[error("invalid transform configuration: {0}")]
    Config(String),

    /// A transform failed on a record. The record is counted as a
    /// normalization failure and skipped.
    #[error("transform failed: {0}")]
    Failed(String),
}

impl TransformError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }
}
