//! Shared lock wrapper
//!
//! Wraps any sink behind a mutex so concurrent workers serialize their
//! writes and the close happens exactly once at the file or connection
//! level.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;

use crate::{Sink, SinkError};

/// Clone-able handle serializing access to a single sink instance.
#[derive(Clone)]
pub struct SharedSink {
    inner: Arc<Mutex<Box<dyn Sink>>>,
}

impl SharedSink {
    pub fn new(sink: Box<dyn Sink>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(sink)),
        }
    }

    pub async fn write(&self, record: &Value) -> Result<(), SinkError> {
        self.inner.lock().await.write(record).await
    }

    pub async fn close(&self) -> Result<(), SinkError> {
        self.inner.lock().await.close().await
    }
}
