//! Error types for the BuildLedger CLI

use buildledger_budget::AggregationError;
use buildledger_forms::FormError;
use thiserror::Error;

use crate::cli::ExitCode;

/// Main error type for CLI operations
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid input data or arguments
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// File access or I/O error
    #[error("File error: {0}")]
    FileError(String),

    /// Input document could not be parsed
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Schema could not be loaded or evaluated
    #[error("Schema error: {0}")]
    SchemaError(String),

    /// Report could not be serialized
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl CliError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        CliError::InvalidInput(msg.into())
    }

    pub fn file_error(msg: impl Into<String>) -> Self {
        CliError::FileError(msg.into())
    }

    pub fn schema_error(msg: impl Into<String>) -> Self {
        CliError::SchemaError(msg.into())
    }

    /// Check if this is a user-facing error (vs internal)
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            CliError::InvalidInput(_)
                | CliError::FileError(_)
                | CliError::ParseError(_)
                | CliError::SchemaError(_)
        )
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        match self {
            CliError::InvalidInput(_) | CliError::ParseError(_) => ExitCode::InvalidInput,
            CliError::FileError(_) => ExitCode::FileError,
            CliError::SchemaError(_) => ExitCode::SchemaError,
            CliError::SerializationError(_) | CliError::InternalError(_) => ExitCode::InternalError,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::FileError(err.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::ParseError(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for CliError {
    fn from(err: serde_yaml::Error) -> Self {
        CliError::ParseError(format!("YAML error: {}", err))
    }
}

impl From<toml::de::Error> for CliError {
    fn from(err: toml::de::Error) -> Self {
        CliError::ParseError(format!("TOML error: {}", err))
    }
}

impl From<FormError> for CliError {
    fn from(err: FormError) -> Self {
        match err {
            FormError::SchemaEvaluator { .. } | FormError::InvalidSchema(_) => {
                CliError::SchemaError(err.to_string())
            }
            FormError::File { .. } => CliError::FileError(err.to_string()),
            FormError::Parse(msg) => CliError::ParseError(msg),
            FormError::Config(msg) => CliError::InvalidInput(msg),
            other => CliError::InternalError(other.to_string()),
        }
    }
}

impl From<AggregationError> for CliError {
    fn from(err: AggregationError) -> Self {
        CliError::InvalidInput(err.to_string())
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
