//! Query error types
//!
//! Error code: QUERY_ERROR. Raised for malformed pipelines and type
//! mismatches; never recovered from and never paired with partial results.

use thiserror::Error;

/// Result type for pipeline operations
pub type QueryResult<T> = Result<T, QueryError>;

/// Pipeline evaluation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// Operator applied to a value of the wrong type
    #[error("{operator} expects {expected}, got {actual}")]
    TypeMismatch {
        operator: &'static str,
        expected: &'static str,
        actual: String,
    },

    /// `$divide` with a zero divisor
    #[error("$divide by zero")]
    DivideByZero,

    /// `$$name` not bound by an enclosing `let`
    #[error("use of undefined variable: $${0}")]
    UnknownVariable(String),

    /// Stage whose parameters cannot be evaluated
    #[error("invalid {stage} stage: {reason}")]
    InvalidStage { stage: &'static str, reason: String },
}

impl QueryError {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        "QUERY_ERROR"
    }

    pub(crate) fn type_mismatch(operator: &'static str, expected: &'static str, actual: &str) -> Self {
        QueryError::TypeMismatch {
            operator,
            expected,
            actual: actual.to_string(),
        }
    }

    pub(crate) fn invalid_stage(stage: &'static str, reason: impl Into<String>) -> Self {
        QueryError::InvalidStage {
            stage,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = QueryError::type_mismatch("$size", "array", "missing");
        assert_eq!(err.to_string(), "$size expects array, got missing");
        assert_eq!(err.code(), "QUERY_ERROR");
    }

    #[test]
    fn test_unknown_variable_display() {
        let err = QueryError::UnknownVariable("restaurantId".into());
        assert_eq!(err.to_string(), "use of undefined variable: $$restaurantId");
    }
}
