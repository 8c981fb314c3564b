//! Error types for the leasewise engine.
//!
//! Provides [`LeasewiseError`] as the top-level error type. Variants are
//! grouped into user-reportable problems (missing dataset, bad command
//! input) and genuine faults (I/O, serialization). Every user-reportable
//! variant renders to plain text suitable for showing in a chat answer.

use thiserror::Error;

/// Top-level error type for the leasewise engine.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum LeasewiseError {
    // ── User-reportable ──────────────────────────────────────────────

    /// The VM dataset file does not exist.
    #[error("dataset not found: {path}")]
    DatasetMissing {
        /// Path that was checked.
        path: String,
    },

    /// The dataset exists but cannot be interpreted (missing columns,
    /// unparseable numeric fields).
    #[error("invalid dataset: {reason}")]
    DatasetInvalid {
        /// What is wrong with the file.
        reason: String,
    },

    /// A tool command string was not recognized. The message carries a
    /// usage hint rather than a stack trace.
    #[error("{usage}")]
    UnknownCommand {
        /// Usage hint listing the accepted commands.
        usage: String,
    },

    /// Manually supplied input failed validation (wrong field count,
    /// unparseable cost values).
    #[error("validation error: {0}")]
    Validation(String),

    /// Configuration is malformed or semantically invalid.
    #[error("invalid config: {reason}")]
    ConfigInvalid {
        /// What is wrong with the configuration.
        reason: String,
    },

    // ── Faults ───────────────────────────────────────────────────────

    /// Underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization / deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML configuration parse error.
    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Convenience alias for results across leasewise crates.
pub type Result<T> = std::result::Result<T, LeasewiseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = LeasewiseError::DatasetMissing {
            path: "/data/vms.csv".into(),
        };
        assert_eq!(err.to_string(), "dataset not found: /data/vms.csv");

        let err = LeasewiseError::Validation("need 5 fields".into());
        assert_eq!(err.to_string(), "validation error: need 5 fields");

        let err = LeasewiseError::UnknownCommand {
            usage: "Commands: 'all', 'zombie'".into(),
        };
        assert_eq!(err.to_string(), "Commands: 'all', 'zombie'");
    }

    #[test]
    fn error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: LeasewiseError = io_err.into();
        assert!(matches!(err, LeasewiseError::Io(_)));
    }

    #[test]
    fn error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{{bad}}").unwrap_err();
        let err: LeasewiseError = json_err.into();
        assert!(matches!(err, LeasewiseError::Json(_)));
    }
}
