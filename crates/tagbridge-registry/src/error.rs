//! Error types for configuration and snapshot loading.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading configuration or a snapshot.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O error.
    #[error("File I/O error at {path}: {source}")]
    IoError {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// YAML deserialization error.
    #[error("YAML error in {path}: {source}")]
    YamlError {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_yaml::Error,
    },

    /// JSON deserialization error.
    #[error("JSON error in {path}: {source}")]
    JsonError {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// Snapshot content is inconsistent.
    #[error("Invalid snapshot: {message}")]
    InvalidSnapshot {
        /// Error message.
        message: String,
    },

    /// An environment override could not be parsed.
    #[error("Invalid value '{value}' for {variable}")]
    InvalidEnv {
        /// Variable name.
        variable: &'static str,
        /// Offending value.
        value: String,
    },

    /// A digest or reference in the snapshot is malformed.
    #[error(transparent)]
    Core(#[from] tagbridge_core::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_snapshot() {
        let err = ConfigError::InvalidSnapshot {
            message: "duplicate repository user/app".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid snapshot: duplicate repository user/app"
        );
    }

    #[test]
    fn test_error_display_invalid_env() {
        let err = ConfigError::InvalidEnv {
            variable: "TAGBRIDGE_UNTAG_LOCAL",
            value: "maybe".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid value 'maybe' for TAGBRIDGE_UNTAG_LOCAL"
        );
    }
}
