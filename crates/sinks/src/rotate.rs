//! Size-rotating JSONL sink
//!
//! Writes JSON lines to `<base>` until the pending record would push the
//! current segment past `max_bytes`, then closes the segment and opens
//! `<base>.<index>`. With `max_files > 0`, rotation deletes the segment
//! `max_files` generations back; `max_files == 0` disables deletion.

use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;

use crate::{Sink, SinkError};

#[cfg(test)]
#[path = "rotate_test.rs"]
mod tests;

/// JSONL writer owning a sequence of numbered file segments.
#[derive(Debug)]
pub struct RotatingJsonlSink {
    base_path: PathBuf,
    max_bytes: u64,
    max_files: u64,

    current: Option<File>,
    current_size: u64,
    index: u64,
}

impl RotatingJsonlSink {
    pub fn new(
        base_path: impl Into<PathBuf>,
        max_bytes: u64,
        max_files: u64,
    ) -> Result<Self, SinkError> {
        let mut sink = Self {
            base_path: base_path.into(),
            max_bytes,
            max_files,
            current: None,
            current_size: 0,
            index: 0,
        };
        sink.open_segment()?;
        Ok(sink)
    }

    /// Index of the segment currently being written.
    pub fn current_index(&self) -> u64 {
        self.index
    }

    fn segment_path(&self, index: u64) -> PathBuf {
        if index == 0 {
            self.base_path.clone()
        } else {
            let mut name = self.base_path.as_os_str().to_owned();
            name.push(format!(".{index}"));
            PathBuf::from(name)
        }
    }

    fn open_segment(&mut self) -> Result<(), SinkError> {
        let target = self.segment_path(self.index);
        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| SinkError::open(e.to_string()))?;
        }
        let file = File::create(&target).map_err(|e| SinkError::open(e.to_string()))?;
        self.current = Some(file);
        self.current_size = 0;
        Ok(())
    }

    fn rotate(&mut self) -> Result<(), SinkError> {
        if let Some(file) = self.current.take() {
            file.sync_all()
                .map_err(|e| SinkError::rotate(e.to_string()))?;
        }
        self.index += 1;
        if self.max_files > 0 && self.index > self.max_files {
            let expired = self.segment_path(self.index - self.max_files);
            // Retention is best effort; a missing segment is not an error.
            let _ = fs::remove_file(expired);
        }
        self.open_segment()
    }
}

#[async_trait]
impl Sink for RotatingJsonlSink {
    async fn write(&mut self, record: &Value) -> Result<(), SinkError> {
        let mut line =
            serde_json::to_vec(record).map_err(|e| SinkError::write(e.to_string()))?;
        line.push(b'\n');

        if self.current_size + line.len() as u64 > self.max_bytes {
            self.rotate()?;
        }

        let file = self
            .current
            .as_mut()
            .ok_or_else(|| SinkError::write("segment already closed".to_string()))?;
        file.write_all(&line)
            .map_err(|e| SinkError::write(e.to_string()))?;
        self.current_size += line.len() as u64;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SinkError> {
        if let Some(file) = self.current.take() {
            file.sync_all()
                .map_err(|e| SinkError::write(e.to_string()))?;
        }
        Ok(())
    }
}
