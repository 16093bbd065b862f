//! Error types for Folio.

use serde::Serialize;
use thiserror::Error;

/// Top-level error type for Folio operations.
#[derive(Debug, Error)]
pub enum FolioError {
    /// Contact relay errors
    #[error("Contact error: {0}")]
    Contact(#[from] ContactError),

    /// Analytics errors
    #[error("Analytics error: {0}")]
    Analytics(#[from] AnalyticsError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A single field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Name of the offending field (`name`, `email`, `message`)
    pub field: String,
    /// Human-readable explanation
    pub message: String,
    /// The submitted value, after trimming
    pub value: String,
}

impl FieldError {
    /// Creates a field error.
    #[must_use]
    pub fn new(field: &str, message: &str, value: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
            value: value.to_string(),
        }
    }
}

/// Contact relay errors.
#[derive(Debug, Error)]
pub enum ContactError {
    /// Submission failed validation; user-correctable
    #[error("Validation failed ({} field(s))", .0.len())]
    Validation(Vec<FieldError>),

    /// Mail transport failed; reported generically and never retried
    #[error("Mail transport failed: {0}")]
    Transport(String),
}

/// Analytics errors.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Project view posted without a project id
    #[error("projectId is required")]
    MissingProjectId,

    /// Project id longer than the tracked limit
    #[error("projectId must be at most {max} characters")]
    ProjectIdTooLong {
        /// Limit in characters
        max: usize,
    },

    /// Anything else; reported with a generic message
    #[error("Unexpected analytics failure: {0}")]
    Unexpected(String),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be parsed
    #[error("Failed to parse config: {0}")]
    Parse(String),

    /// Config could not be written as TOML
    #[error("Failed to serialize config: {0}")]
    Serialize(String),

    /// A value is out of its allowed range
    #[error("Invalid value for {field}: {reason}")]
    Invalid {
        /// Field name
        field: String,
        /// Why it was rejected
        reason: String,
    },
}

/// Result type alias for Folio operations.
pub type FolioResult<T> = Result<T, FolioError>;
