//! Error types for the schema registry

use thiserror::Error;

use crate::validate::ValidationErrors;

/// Result type for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Schema registry errors
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Record type not found: {name}{}", suggestion_hint(.suggestion))]
    NotFound {
        name: String,
        suggestion: Option<String>,
    },

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Record type already registered: {0}")]
    DuplicateRecordType(String),

    #[error("Duplicate field {field} in record type {record_type}")]
    DuplicateField { record_type: String, field: String },

    #[error("Invalid record type definition: {0}")]
    InvalidDefinition(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

impl SchemaError {
    /// Violations carried by a validation failure, if this is one
    pub fn violations(&self) -> Option<&ValidationErrors> {
        match self {
            SchemaError::Validation(errors) => Some(errors),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, SchemaError::NotFound { .. })
    }
}

fn suggestion_hint(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(" (did you mean '{}'?)", s),
        None => String::new(),
    }
}
