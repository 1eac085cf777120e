//! Configuration error types

use std::io;
use thiserror::Error;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Failed to parse YAML or JSON
    #[error("failed to parse config '{path}': {message}")]
    Parse { path: String, message: String },

    /// One or more validation rules were violated. All violations are
    /// collected before failing.
    #[error("configuration validation failed:\n  - {}", violations.join("\n  - "))]
    Validation { violations: Vec<String> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_lists_all_violations() {
        let err = ConfigError::Validation {
            violations: vec!["first problem".into(), "second problem".into()],
        };
        let text = err.to_string();
        assert!(text.contains("first problem"));
        assert!(text.contains("second problem"));
        assert!(text.starts_with("configuration validation failed"));
    }
}
