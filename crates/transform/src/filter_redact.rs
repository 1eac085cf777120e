//! filter_redact - level/service allowlists plus field redaction
//!
//! The built-in transform. Checks the level allowlist first (reason
//! `"level"`), then the service allowlist (reason `"service"`); records
//! that pass both have the configured keys deleted from `fields`. Empty
//! allowlists allow everything.

use std::collections::HashSet;

use logsift_config::Config;
use logsift_record::NormalizedRecord;

use crate::{Transform, TransformFactory, TransformResult, Verdict};

#[cfg(test)]
#[path = "filter_redact_test.rs"]
mod tests;

/// Level/service allowlist filter with exact-key redaction.
#[derive(Debug)]
pub struct FilterRedact {
    /// Allowed levels, uppercased. Empty = allow all.
    levels: HashSet<String>,
    /// Allowed services, lowercased. Empty = allow all.
    services: HashSet<String>,
    /// Exact `fields` keys to delete from surviving records.
    redact_keys: HashSet<String>,
}

impl FilterRedact {
    pub fn new(
        levels: impl IntoIterator<Item = String>,
        services: impl IntoIterator<Item = String>,
        redact_keys: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            levels: levels
                .into_iter()
                .filter(|v| !v.is_empty())
                .map(|v| v.to_uppercase())
                .collect(),
            services: services
                .into_iter()
                .filter(|v| !v.is_empty())
                .map(|v| v.to_lowercase())
                .collect(),
            redact_keys: redact_keys.into_iter().filter(|v| !v.is_empty()).collect(),
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(
            cfg.filter_levels.iter().cloned(),
            cfg.filter_services.iter().cloned(),
            cfg.redact_keys.iter().cloned(),
        )
    }
}

impl Transform for FilterRedact {
    fn apply(&self, mut record: NormalizedRecord) -> TransformResult<Verdict> {
        if !self.levels.is_empty() && !self.levels.contains(&record.level.to_uppercase()) {
            return Ok(Verdict::Drop {
                reason: "level".into(),
            });
        }
        if !self.services.is_empty() && !self.services.contains(&record.service.to_lowercase()) {
            return Ok(Verdict::Drop {
                reason: "service".into(),
            });
        }

        if !self.redact_keys.is_empty() && !record.fields.is_empty() {
            for key in &self.redact_keys {
                record.fields.remove(key);
            }
        }

        Ok(Verdict::Keep(record))
    }

    fn name(&self) -> &'static str {
        "filter_redact"
    }
}

/// Factory for [`FilterRedact`].
pub struct FilterRedactFactory;

impl TransformFactory for FilterRedactFactory {
    fn create(&self, cfg: &Config) -> TransformResult<Box<dyn Transform>> {
        Ok(Box::new(FilterRedact::from_config(cfg)))
    }

    fn name(&self) -> &'static str {
        "filter_redact"
    }
}
