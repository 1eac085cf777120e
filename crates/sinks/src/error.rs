//! Common sink errors

use thiserror::Error;

/// Errors shared by all sink types
#[derive(Debug, Error)]
pub enum SinkError {
    /// Failed to open or initialize a sink. Fatal at startup.
    #[error("open sink: {0}")]
    Open(String),

    /// Failed while writing a record.
    #[error("write sink: {0}")]
    Write(String),

    /// Failed while rotating an output segment.
    #[error("rotate sink: {0}")]
    Rotate(String),

    /// The requested output type is reserved but not built.
    #[error("output type {0:?} not implemented")]
    NotImplemented(String),

    /// The requested output type is not recognized at all.
    #[error("unknown output type {0:?}")]
    UnknownType(String),

    /// The operation observed cancellation before completing.
    #[error("sink operation cancelled")]
    Cancelled,
}

impl SinkError {
    pub fn open(msg: impl Into<String>) -> Self {
        Self::Open(msg.into())
    }

    pub fn write(msg: impl Into<String>) -> Self {
        Self::Write(msg.into())
    }

    pub fn rotate(msg: impl Into<String>) -> Self {
        Self::Rotate(msg.into())
    }
}
