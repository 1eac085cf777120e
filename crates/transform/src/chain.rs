//! Sequential transform execution
//!
//! Applies transforms in configuration order. The first `Drop` verdict
//! short-circuits the chain; the first error aborts the record.

use logsift_config::Config;
use logsift_record::NormalizedRecord;

use crate::{Transform, TransformRegistry, TransformResult, Verdict};

#[cfg(test)]
#[path = "chain_test.rs"]
mod tests;

/// Default chain when the config names no transforms.
const DEFAULT_TRANSFORMS: &[&str] = &["filter_redact"];

/// Ordered list of transforms applied to every normalized record.
pub struct Chain {
    transforms: Vec<Box<dyn Transform>>,
}

impl Chain {
    /// Create a chain from an explicit transform list.
    pub fn new(transforms: Vec<Box<dyn Transform>>) -> Self {
        Self { transforms }
    }

    /// Build the chain named by `cfg.transforms` (default `filter_redact`).
    /// An unknown name is a startup error.
    pub fn from_config(registry: &TransformRegistry, cfg: &Config) -> TransformResult<Self> {
        let names: Vec<String> = if cfg.transforms.is_empty() {
            DEFAULT_TRANSFORMS.iter().map(|s| s.to_string()).collect()
        } else {
            cfg.transforms.clone()
        };

        let mut transforms = Vec::with_capacity(names.len());
        for name in &names {
            transforms.push(registry.create(name, cfg)?);
        }
        Ok(Self { transforms })
    }

    /// An empty chain that keeps every record untouched.
    pub fn empty() -> Self {
        Self {
            transforms: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Names of the transforms in application order.
    pub fn names(&self) -> Vec<&'static str> {
        self.transforms.iter().map(|t| t.name()).collect()
    }

    /// Run the record through every transform in order.
    pub fn apply(&self, record: NormalizedRecord) -> TransformResult<Verdict> {
        let mut current = record;
        for transform in &self.transforms {
            match transform.apply(current)? {
                Verdict::Keep(next) => current = next,
                drop @ Verdict::Drop { .. } => return Ok(drop),
            }
        }
        Ok(Verdict::Keep(current))
    }
}
