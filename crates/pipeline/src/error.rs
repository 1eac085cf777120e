//! Pipeline error types

use std::time::Duration;

use thiserror::Error;

/// Errors that terminate the pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Transform chain could not be built. Fatal at startup.
    #[error("load transforms: {0}")]
    Transform(#[from] logsift_transform::TransformError),

    /// Sink or DLQ construction/write error.
    #[error(transparent)]
    Sink(#[from] logsift_sinks::SinkError),

    /// The input scanner failed (I/O error or over-long line).
    #[error("scanner error: {0}")]
    Scan(String),

    /// The final report could not be written.
    #[error(transparent)]
    Report(#[from] logsift_report::ReportError),

    /// The run was cancelled by signal before the input was exhausted.
    #[error("pipeline cancelled")]
    Cancelled,

    /// Workers did not drain within the shutdown timeout.
    #[error("shutdown timeout exceeded after {0:?}")]
    ShutdownTimeout(Duration),
}
