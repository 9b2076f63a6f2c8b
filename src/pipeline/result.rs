//! Result types for query execution

use serde_json::Value;

/// Result of a `find` or `aggregate` run
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    /// Documents in result order
    pub documents: Vec<Value>,
    /// Number of documents read from the source collection
    pub scanned_count: usize,
    /// Number of documents returned
    pub returned_count: usize,
}

impl ExecutionResult {
    pub fn new(documents: Vec<Value>, scanned_count: usize) -> Self {
        let returned_count = documents.len();
        Self {
            documents,
            scanned_count,
            returned_count,
        }
    }

    pub fn len(&self) -> usize {
        self.returned_count
    }

    pub fn is_empty(&self) -> bool {
        self.returned_count == 0
    }

    pub fn into_documents(self) -> Vec<Value> {
        self.documents
    }
}
