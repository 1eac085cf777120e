//! HTTP sink
//!
//! POSTs each record as JSON to a configured endpoint. Any 2xx status is
//! success; other statuses and transport errors are transient and retried
//! at this layer with plain exponential backoff (the jittered retry policy
//! lives one level up, in the pipeline's retry coordinator).

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::{Sink, SinkError};

#[cfg(test)]
#[path = "http_test.rs"]
mod tests;

/// Fixed request timeout for the owned HTTP client.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Record writer POSTing to an HTTP endpoint.
#[derive(Debug)]
pub struct HttpSink {
    url: String,
    client: reqwest::Client,
    max_retries: u32,
    backoff_base: Duration,
    cancel: CancellationToken,
}

impl HttpSink {
    pub fn new(
        url: impl Into<String>,
        max_retries: u32,
        backoff_base: Duration,
        cancel: CancellationToken,
    ) -> Result<Self, SinkError> {
        let url = url.into();
        if url.is_empty() {
            return Err(SinkError::open("URL required for http sink"));
        }
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SinkError::open(e.to_string()))?;

        Ok(Self {
            url,
            client,
            max_retries,
            backoff_base,
            cancel,
        })
    }

    async fn post_once(&self, record: &Value) -> Result<(), SinkError> {
        let response = self
            .client
            .post(&self.url)
            .json(record)
            .send()
            .await
            .map_err(|e| SinkError::write(format!("http request failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(SinkError::write(format!(
                "http error status {}",
                status.as_u16()
            )))
        }
    }
}

#[async_trait]
impl Sink for HttpSink {
    async fn write(&mut self, record: &Value) -> Result<(), SinkError> {
        let mut last_err = SinkError::write("no attempts made");

        for attempt in 0..=self.max_retries {
            if self.cancel.is_cancelled() {
                return Err(SinkError::Cancelled);
            }

            match self.post_once(record).await {
                Ok(()) => return Ok(()),
                Err(err) => {
                    tracing::debug!(
                        attempt,
                        error = %err,
                        url = %self.url,
                        "http sink write attempt failed"
                    );
                    last_err = err;
                }
            }

            if attempt < self.max_retries {
                let sleep = self.backoff_base * 2u32.saturating_pow(attempt);
                tokio::select! {
                    _ = self.cancel.cancelled() => return Err(SinkError::Cancelled),
                    _ = tokio::time::sleep(sleep) => {}
                }
            }
        }

        Err(last_err)
    }

    async fn close(&mut self) -> Result<(), SinkError> {
        // Dropping the client closes the idle connection pool.
        Ok(())
    }
}
