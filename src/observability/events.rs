//! Observable events
//!
//! Events are explicit and typed.

use std::fmt;

use super::logger::Severity;

/// Observable events in inspectdb
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration file loaded
    ConfigLoaded,

    // Validators
    /// Validator installed on a collection
    ValidatorInstalled,
    /// Write rejected by a validator
    DocumentRejected,
    /// Non-conforming write accepted under `warn`
    ValidationWarning,

    // Fixtures
    /// Fixture files loaded into the store
    FixturesLoaded,

    // Queries
    /// Catalog query started
    QueryBegin,
    /// Catalog query finished
    QueryComplete,
    /// Catalog query failed
    QueryFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::ValidatorInstalled => "VALIDATOR_INSTALLED",
            Event::DocumentRejected => "DOCUMENT_REJECTED",
            Event::ValidationWarning => "VALIDATION_WARNING",
            Event::FixturesLoaded => "FIXTURES_LOADED",
            Event::QueryBegin => "QUERY_BEGIN",
            Event::QueryComplete => "QUERY_COMPLETE",
            Event::QueryFailed => "QUERY_FAILED",
        }
    }

    /// Returns true for events that report a failure
    pub fn is_failure(&self) -> bool {
        matches!(self, Event::DocumentRejected | Event::QueryFailed)
    }

    /// Severity the event is always logged at. Failures are WARN; the
    /// caller surfaces the error itself.
    pub fn severity(&self) -> Severity {
        if self.is_failure() {
            Severity::Warn
        } else {
            Severity::Info
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
