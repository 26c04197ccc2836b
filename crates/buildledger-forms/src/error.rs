//! Error types for the form engine
//!
//! Field-level validation failures are never represented here: they are
//! captured into the form's error map. These variants cover structural and
//! collaborator failures that must reach the caller.

use std::path::Path;
use thiserror::Error;

/// Main error type for form operations
#[derive(Error, Debug)]
pub enum FormError {
    /// A rule could not be evaluated (malformed rule, failing predicate)
    #[error("Schema evaluator error on '{field}': {message}")]
    SchemaEvaluator { field: String, message: String },

    /// The schema itself is structurally invalid
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// The on-submit collaborator rejected the data
    #[error("Submission failed: {0}")]
    Submission(String),

    /// Record store failure
    #[error("Record store error: {0}")]
    Store(String),

    /// Record lookup by id failed
    #[error("Record not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    /// Form configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Schema or config file could not be read
    #[error("File error on '{path}': {message}")]
    File { path: String, message: String },

    /// Schema, config or data document could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Metrics registration error
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

impl FormError {
    /// Create a schema evaluator error
    pub fn evaluator(field: impl Into<String>, message: impl Into<String>) -> Self {
        FormError::SchemaEvaluator {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an invalid schema error
    pub fn invalid_schema(msg: impl Into<String>) -> Self {
        FormError::InvalidSchema(msg.into())
    }

    /// Create a submission error
    pub fn submission(msg: impl Into<String>) -> Self {
        FormError::Submission(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        FormError::Config(msg.into())
    }

    /// Wrap a read failure with the path that failed
    pub fn file(path: &Path, err: std::io::Error) -> Self {
        FormError::File {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }

    /// Check if this error stems from caller-supplied input (vs internal)
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            FormError::InvalidSchema(_)
                | FormError::Config(_)
                | FormError::File { .. }
                | FormError::Parse(_)
        )
    }
}

impl From<serde_json::Error> for FormError {
    fn from(err: serde_json::Error) -> Self {
        FormError::Parse(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for FormError {
    fn from(err: serde_yaml::Error) -> Self {
        FormError::Parse(format!("YAML error: {}", err))
    }
}

impl From<toml::de::Error> for FormError {
    fn from(err: toml::de::Error) -> Self {
        FormError::Parse(format!("TOML error: {}", err))
    }
}

/// Result type alias for form operations
pub type Result<T> = std::result::Result<T, FormError>;
