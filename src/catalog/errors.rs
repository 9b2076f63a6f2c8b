//! Catalog errors

use thiserror::Error;

use crate::pipeline::QueryError;

/// Result type for catalog runs
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Catalog errors
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Pipeline evaluation failed
    #[error("{0}")]
    Query(#[from] QueryError),

    /// A result document did not fit the row type
    #[error("Cannot decode {query} row: {source}")]
    Decode {
        query: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Unrecognized catalog entry name
    #[error("Unknown catalog entry: {0}")]
    UnknownEntry(String),
}

impl CatalogError {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            CatalogError::Query(e) => e.code(),
            CatalogError::Decode { .. } => "DECODE_ERROR",
            CatalogError::UnknownEntry(_) => "UNKNOWN_ENTRY",
        }
    }
}
