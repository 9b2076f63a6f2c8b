//! Document store errors

use thiserror::Error;

use crate::schema::SchemaError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Document store errors
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Validator rejection or configuration failure
    #[error("{0}")]
    Schema(#[from] SchemaError),

    /// `_id` already present in the collection
    #[error("Duplicate key in {collection}: _id {id}")]
    DuplicateKey { collection: String, id: String },

    /// No document with the given `_id`
    #[error("Document not found in {collection}: _id {id}")]
    DocumentNotFound { collection: String, id: String },

    /// Not a JSON object, or a malformed `_id`
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
}

impl StoreError {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Schema(e) => e.code().code(),
            StoreError::DuplicateKey { .. } => "DUPLICATE_KEY",
            StoreError::DocumentNotFound { .. } => "DOCUMENT_NOT_FOUND",
            StoreError::InvalidDocument(_) => "INVALID_DOCUMENT",
        }
    }

    /// Returns true for a validator rejection
    pub fn is_rejection(&self) -> bool {
        matches!(self, StoreError::Schema(e) if e.is_rejection())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ValidationDetails;

    #[test]
    fn test_codes() {
        let rejected: StoreError =
            SchemaError::schema_rejected("restaurants", vec![ValidationDetails::missing_field("name")]).into();
        assert_eq!(rejected.code(), "SCHEMA_REJECTED");
        assert!(rejected.is_rejection());

        let dup = StoreError::DuplicateKey {
            collection: "restaurants".into(),
            id: "abc".into(),
        };
        assert_eq!(dup.code(), "DUPLICATE_KEY");
        assert!(!dup.is_rejection());
        assert_eq!(dup.to_string(), "Duplicate key in restaurants: _id abc");
    }
}
