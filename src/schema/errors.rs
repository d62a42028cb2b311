//! Schema catalog errors
//!
//! A schema error is never fatal: the builder disables field-dependent
//! controls and shows a blocking message until a later load succeeds.

use thiserror::Error;

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Schema catalog errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Schema endpoint could not be reached or answered with an error
    #[error("Schema catalog unavailable: {0}")]
    Unavailable(String),

    /// Catalog decoded but is structurally invalid
    #[error("Malformed schema catalog: {0}")]
    Malformed(String),

    /// Two fields share a key
    #[error("Duplicate field key: {0}")]
    DuplicateField(String),

    /// Catalog file could not be read
    #[error("Failed to read schema file {path}: {reason}")]
    Io { path: String, reason: String },
}

impl SchemaError {
    /// Message shown in place of the field-dependent controls
    pub fn blocking_message(&self) -> String {
        format!("Query builder unavailable. {}", self)
    }
}
