//! Batching sink wrapper
//!
//! Buffers records and writes them to the wrapped sink in insertion order,
//! either when the buffer reaches `batch_size` or when the background
//! flusher ticks. `close` stops the flusher, flushes the remainder, and
//! closes the wrapped sink.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{Sink, SinkError};

#[cfg(test)]
#[path = "batched_test.rs"]
mod tests;

/// Buffering wrapper around any sink.
#[derive(Debug)]
pub struct BatchedSink {
    wrapped: Arc<Mutex<Box<dyn Sink>>>,
    buffer: Arc<Mutex<Vec<Value>>>,
    batch_size: usize,
    flusher_cancel: CancellationToken,
    flusher: Option<JoinHandle<()>>,
}

impl BatchedSink {
    /// Wrap `sink`, flushing every `batch_size` records and on every
    /// `flush_interval` tick. A zero `batch_size` is a construction error;
    /// a zero `flush_interval` falls back to one second.
    pub fn new(
        sink: Box<dyn Sink>,
        batch_size: usize,
        flush_interval: Duration,
    ) -> Result<Self, SinkError> {
        if batch_size == 0 {
            return Err(SinkError::open("batch size must be positive"));
        }
        let flush_interval = if flush_interval.is_zero() {
            Duration::from_secs(1)
        } else {
            flush_interval
        };

        let wrapped = Arc::new(Mutex::new(sink));
        let buffer = Arc::new(Mutex::new(Vec::with_capacity(batch_size)));
        let flusher_cancel = CancellationToken::new();

        let flusher = tokio::spawn(flush_loop(
            Arc::clone(&wrapped),
            Arc::clone(&buffer),
            flush_interval,
            flusher_cancel.clone(),
        ));

        Ok(Self {
            wrapped,
            buffer,
            batch_size,
            flusher_cancel,
            flusher: Some(flusher),
        })
    }
}

#[async_trait]
impl Sink for BatchedSink {
    async fn write(&mut self, record: &Value) -> Result<(), SinkError> {
        let should_flush = {
            let mut buffer = self.buffer.lock().await;
            buffer.push(record.clone());
            buffer.len() >= self.batch_size
        };

        if should_flush {
            flush(&self.wrapped, &self.buffer).await?;
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SinkError> {
        self.flusher_cancel.cancel();
        if let Some(handle) = self.flusher.take() {
            let _ = handle.await;
        }
        flush(&self.wrapped, &self.buffer).await?;
        self.wrapped.lock().await.close().await
    }
}

/// Drain the buffer and write its contents in insertion order.
async fn flush(
    wrapped: &Mutex<Box<dyn Sink>>,
    buffer: &Mutex<Vec<Value>>,
) -> Result<(), SinkError> {
    let pending = {
        let mut buffer = buffer.lock().await;
        if buffer.is_empty() {
            return Ok(());
        }
        std::mem::take(&mut *buffer)
    };

    let mut sink = wrapped.lock().await;
    for record in &pending {
        sink.write(record).await?;
    }
    Ok(())
}

/// Background flusher: drains the buffer on every tick until cancelled.
async fn flush_loop(
    wrapped: Arc<Mutex<Box<dyn Sink>>>,
    buffer: Arc<Mutex<Vec<Value>>>,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // The first tick fires immediately; skip it.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = ticker.tick() => {
                if let Err(err) = flush(&wrapped, &buffer).await {
                    tracing::warn!(error = %err, "periodic batch flush failed");
                }
            }
        }
    }
}
