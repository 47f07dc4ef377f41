//! Schema registry error types
//!
//! Error codes:
//! - MALFORMED_SCHEMA
//! - SCHEMA_IO
//! - SCHEMA_PARSE
//! - REGISTRY_ALREADY_INSTALLED

use thiserror::Error;

/// Result type for registry operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised while defining, loading or installing schemas.
///
/// Record validation failures are `ValidationError`s, not these.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Schema definition is structurally invalid
    #[error("Malformed schema '{type_name}': {reason}")]
    Malformed { type_name: String, reason: String },

    /// Schema file or directory could not be read or written
    #[error("Schema I/O error at '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Schema file is not a valid schema document
    #[error("Invalid schema JSON in '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// The process-wide registry was already installed
    #[error("Process-wide schema registry already installed")]
    AlreadyInstalled,
}

impl SchemaError {
    pub fn malformed(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        SchemaError::Malformed {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaError::Malformed { .. } => "MALFORMED_SCHEMA",
            SchemaError::Io { .. } => "SCHEMA_IO",
            SchemaError::Parse { .. } => "SCHEMA_PARSE",
            SchemaError::AlreadyInstalled => "REGISTRY_ALREADY_INSTALLED",
        }
    }
}
