//! JSONL passthrough sink
//!
//! Serializes each record as one compact JSON object terminated by a
//! newline, flushed per record so tail-readers see output promptly.

use std::io::Write;

use async_trait::async_trait;
use serde_json::Value;

use crate::{Sink, SinkError};

#[cfg(test)]
#[path = "jsonl_test.rs"]
mod tests;

/// JSON-lines writer over an owned output handle (stdout or a file).
pub struct JsonlSink {
    writer: Box<dyn Write + Send>,
}

impl std::fmt::Debug for JsonlSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonlSink").finish_non_exhaustive()
    }
}

impl JsonlSink {
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self { writer }
    }

    /// A sink writing to the process stdout. Closing it only flushes;
    /// stdout itself stays open.
    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }
}

#[async_trait]
impl Sink for JsonlSink {
    async fn write(&mut self, record: &Value) -> Result<(), SinkError> {
        let mut line =
            serde_json::to_vec(record).map_err(|e| SinkError::write(e.to_string()))?;
        line.push(b'\n');
        self.writer
            .write_all(&line)
            .and_then(|_| self.writer.flush())
            .map_err(|e| SinkError::write(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), SinkError> {
        self.writer
            .flush()
            .map_err(|e| SinkError::write(e.to_string()))
    }
}
