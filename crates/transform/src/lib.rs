//! logsift - Transform
//!
//! Per-record transform chain applied between normalization and the sink
//! queue. A transform may mutate the record, drop it with a reason, or
//! fail it.
//!
//! # Architecture
//!
//! ```text
//! [NormalizedRecord] → [Transform 1] → [Transform 2] → ... → Keep | Drop(reason)
//! ```
//!
//! Transforms are registered by lowercase name in a [`TransformRegistry`]
//! and assembled into a [`Chain`] from the configured name list
//! (default: `["filter_redact"]`). An unknown name is a startup error.
//!
//! # Design
//!
//! - **Fast**: transforms run inline on the producer thread; they must not
//!   block on I/O.
//! - **Short-circuit**: the first `Drop` verdict stops the chain; the first
//!   error aborts the record.

mod chain;
mod error;
mod filter_redact;
mod registry;

pub use chain::Chain;
pub use error::TransformError;
pub use filter_redact::{FilterRedact, FilterRedactFactory};
pub use registry::{TransformFactory, TransformRegistry};

use logsift_record::NormalizedRecord;

/// Result type for transform operations
pub type TransformResult<T> = Result<T, TransformError>;

/// Outcome of applying one transform (or a whole chain) to a record.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// The record survives, possibly mutated.
    Keep(NormalizedRecord),
    /// The record is dropped; `reason` feeds the report's filter stats.
    Drop { reason: String },
}

/// A single step in the per-record transform chain.
///
/// Implementors must be `Send + Sync`; the chain is shared with the
/// pipeline driver task.
pub trait Transform: Send + Sync + std::fmt::Debug {
    /// Apply this transform, consuming the record and returning a verdict.
    fn apply(&self, record: NormalizedRecord) -> TransformResult<Verdict>;

    /// Name used in config and logging.
    fn name(&self) -> &'static str;
}

/// Registry with every built-in transform registered.
pub fn builtin_registry() -> TransformRegistry {
    let mut registry = TransformRegistry::new();
    registry.register("filter_redact", FilterRedactFactory);
    registry
}
