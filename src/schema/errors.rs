//! Schema error types
//!
//! Error codes:
//! - SCHEMA_REJECTED (REJECT): a write produced a non-conforming document
//! - CONFIGURATION_ERROR (REJECT): validator targets a missing collection
//!   or the descriptor is malformed

use serde::Serialize;
use std::fmt;

/// Severity levels for schema errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Client request rejected
    Reject,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
        }
    }
}

/// Schema-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// Document violates an installed validator
    SchemaRejected,
    /// Validator installation failed
    ConfigurationError,
}

impl SchemaErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::SchemaRejected => "SCHEMA_REJECTED",
            SchemaErrorCode::ConfigurationError => "CONFIGURATION_ERROR",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        Severity::Reject
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// One validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationDetails {
    /// Field path (e.g., "rating", "$root")
    pub field: String,
    /// Expected type or condition
    pub expected: String,
    /// Actual value or type found
    pub actual: String,
}

impl ValidationDetails {
    pub fn new(field: impl Into<String>, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::new(field, "field to be present", "missing")
    }

    pub fn type_mismatch(field: impl Into<String>, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::new(field, expected, actual)
    }

    pub fn null_value(field: impl Into<String>) -> Self {
        Self::new(field, "non-null value", "null")
    }
}

impl fmt::Display for ValidationDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field '{}': expected {}, got {}", self.field, self.expected, self.actual)
    }
}

/// Schema error type with full context
#[derive(Debug, Clone)]
pub struct SchemaError {
    code: SchemaErrorCode,
    message: String,
    collection: Option<String>,
    details: Vec<ValidationDetails>,
}

impl SchemaError {
    /// Create a rejected-write error
    pub fn schema_rejected(collection: impl Into<String>, details: Vec<ValidationDetails>) -> Self {
        let collection = collection.into();
        let summary = details
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        Self {
            code: SchemaErrorCode::SchemaRejected,
            message: format!("Document failed validation for '{}': {}", collection, summary),
            collection: Some(collection),
            details,
        }
    }

    /// Create an error for a validator aimed at a missing collection
    pub fn collection_not_found(collection: impl Into<String>) -> Self {
        let collection = collection.into();
        Self {
            code: SchemaErrorCode::ConfigurationError,
            message: format!("Collection '{}' does not exist", collection),
            collection: Some(collection),
            details: Vec::new(),
        }
    }

    /// Create an error for a malformed descriptor
    pub fn malformed_descriptor(source: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            code: SchemaErrorCode::ConfigurationError,
            message: format!("Malformed validator '{}': {}", source.into(), reason.into()),
            collection: None,
            details: Vec::new(),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the collection if applicable
    pub fn collection(&self) -> Option<&str> {
        self.collection.as_deref()
    }

    /// Returns validation details (empty for configuration errors)
    pub fn details(&self) -> &[ValidationDetails] {
        &self.details
    }

    pub fn is_rejection(&self) -> bool {
        self.code == SchemaErrorCode::SchemaRejected
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code.severity(), self.code.code(), self.message)
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;
