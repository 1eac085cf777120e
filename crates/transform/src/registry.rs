//! Transform registry - config-driven transform creation
//!
//! Maps lowercase transform names to factories so the chain can be built
//! from the `transforms` config list.

use std::collections::HashMap;

use logsift_config::Config;

use crate::{Transform, TransformError, TransformResult};

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;

/// Factory trait for creating transforms from configuration.
pub trait TransformFactory: Send + Sync {
    /// Create a transform instance from the merged config.
    fn create(&self, cfg: &Config) -> TransformResult<Box<dyn Transform>>;

    /// Name used in error messages.
    fn name(&self) -> &'static str;
}

/// Registry of transform factories keyed by lowercase name.
pub struct TransformRegistry {
    factories: HashMap<String, Box<dyn TransformFactory>>,
}

impl TransformRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a factory. Names are lowercased; re-registering a name
    /// replaces the previous factory.
    pub fn register<F: TransformFactory + 'static>(&mut self, name: &str, factory: F) {
        self.factories
            .insert(name.to_lowercase(), Box::new(factory));
    }

    /// Create a transform by name (case-insensitive).
    pub fn create(&self, name: &str, cfg: &Config) -> TransformResult<Box<dyn Transform>> {
        let factory = self.factories.get(&name.to_lowercase()).ok_or_else(|| {
            TransformError::config(format!(
                "unknown transform {:?}, available: [{}]",
                name,
                self.available().join(", ")
            ))
        })?;
        factory.create(cfg)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(&name.to_lowercase())
    }

    /// Sorted list of registered names.
    pub fn available(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for TransformRegistry {
    fn default() -> Self {
        Self::new()
    }
}
