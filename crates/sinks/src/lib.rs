//! logsift - Sinks
//!
//! Output sinks for the pipeline. Every sink receives already-serialized
//! records (`serde_json::Value`) and owns its destination handle.
//!
//! # Available sinks
//!
//! | Sink | Purpose | Rotation |
//! |------|---------|----------|
//! | `jsonl` | One JSON object per line to stdout or a file | No |
//! | `rotate` | JSONL with size-based segment rotation and retention | Yes |
//! | `http` | POST each record to an endpoint, with inner backoff | No |
//! | `batched` | Buffering wrapper with a periodic flusher | n/a |
//!
//! A [`SharedSink`] lock wrapper serializes concurrent workers onto one
//! sink instance, preserving bit-exact serialization at the file or
//! connection level.
//!
//! # Example
//!
//! ```ignore
//! let sink = sinks::build(&cfg, cancel.clone())?;
//! let shared = SharedSink::new(sink);
//! shared.write(&record_value).await?;
//! shared.close().await?;
//! ```

mod batched;
mod build;
mod error;
mod http;
mod jsonl;
mod rotate;
mod shared;

pub use batched::BatchedSink;
pub use build::{build, open_dlq};
pub use error::SinkError;
pub use http::HttpSink;
pub use jsonl::JsonlSink;
pub use rotate::RotatingJsonlSink;
pub use shared::SharedSink;

use std::fmt::Debug;

use async_trait::async_trait;
use serde_json::Value;

/// Outbound writer abstraction: `write` one record, `close` when done.
///
/// Implementations own their destination and are driven from worker tasks
/// through the [`SharedSink`] lock wrapper.
#[async_trait]
pub trait Sink: Send + Debug {
    /// Write one serialized record.
    async fn write(&mut self, record: &Value) -> Result<(), SinkError>;

    /// Flush and release the destination. Called once on every pipeline
    /// exit path.
    async fn close(&mut self) -> Result<(), SinkError>;
}
