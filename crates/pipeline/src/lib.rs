//! logsift - Pipeline
//!
//! The streaming core: a single producer that parses, normalizes, and
//! transforms input lines, feeding a bounded channel drained by a pool of
//! sink workers with retry, DLQ, and per-stage timing.
//!
//! # Architecture
//!
//! ```text
//! [reader] → [line framing] → [json] → [normalize] → [transforms] ─┐
//!                                                             bounded queue
//!             ┌──────────────┬──────────────┬────────────────────┘
//!         [worker 0]     [worker 1]  ...  [worker W-1]
//!             └── retry+jitter ── SharedSink ── (DLQ on exhaustion)
//! ```
//!
//! # Key design
//!
//! - **Back-pressure**: the producer blocks on a full bounded channel, so
//!   ingestion throttles to sink throughput.
//! - **Cooperative cancellation**: one `CancellationToken` (SIGINT/SIGTERM
//!   in the binary) unblocks the producer send, the worker receive, every
//!   retry wait, and the final shutdown wait.
//! - **Graceful drain**: on cancellation the producer stops reading and the
//!   channel closes; workers drain in-flight items up to the shutdown
//!   timeout.
//! - **No cross-worker ordering**: workers receive FIFO but complete
//!   independently; only the shared sink lock serializes the actual writes.

mod driver;
mod error;
mod retry;

pub use driver::run_pipeline;
pub use error::PipelineError;
pub use retry::{write_with_retry, RetryPolicy};

/// Default queue capacity when the configured size is smaller.
pub const MIN_QUEUE_SIZE: i64 = 128;

/// Maximum accepted input line length. Longer lines are a fatal scan error.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;
