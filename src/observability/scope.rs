//! Scoped BEGIN/COMPLETE/FAILED logging around a catalog query
//!
//! - Logs QUERY_BEGIN on creation
//! - Logs QUERY_COMPLETE with row count and elapsed time on `complete`
//! - Logs QUERY_FAILED on `fail`, or if dropped unfinished

use std::cell::Cell;
use std::time::Instant;

use super::events::Event;
use super::log_event_with_fields;

/// A scope that logs the lifecycle of one query
///
/// ```ignore
/// let scope = ObservationScope::begin("violations_by_date");
/// let rows = run()?;
/// scope.complete(rows.len());
/// ```
pub struct ObservationScope<'a> {
    query: &'a str,
    started: Instant,
    completed: Cell<bool>,
}

impl<'a> ObservationScope<'a> {
    /// Logs QUERY_BEGIN and starts the timer
    pub fn begin(query: &'a str) -> Self {
        log_event_with_fields(Event::QueryBegin, &[("query", query)]);
        Self {
            query,
            started: Instant::now(),
            completed: Cell::new(false),
        }
    }

    /// Milliseconds since `begin`
    pub fn elapsed_ms(&self) -> u128 {
        self.started.elapsed().as_millis()
    }

    /// Logs QUERY_COMPLETE
    pub fn complete(self, rows: usize) {
        self.completed.set(true);
        let rows = rows.to_string();
        let elapsed = self.elapsed_ms().to_string();
        log_event_with_fields(
            Event::QueryComplete,
            &[("query", self.query), ("rows", rows.as_str()), ("elapsed_ms", elapsed.as_str())],
        );
    }

    /// Logs QUERY_FAILED
    pub fn fail(self, reason: &str) {
        self.completed.set(true);
        log_event_with_fields(Event::QueryFailed, &[("query", self.query), ("reason", reason)]);
    }

    pub fn is_completed(&self) -> bool {
        self.completed.get()
    }
}

impl Drop for ObservationScope<'_> {
    fn drop(&mut self) {
        if !self.completed.get() {
            log_event_with_fields(
                Event::QueryFailed,
                &[("query", self.query), ("reason", "scope dropped without completion")],
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_complete() {
        let scope = ObservationScope::begin("test");
        assert!(!scope.is_completed());
        scope.complete(3);
    }

    #[test]
    fn test_scope_fail() {
        let scope = ObservationScope::begin("test");
        scope.fail("division by zero");
    }

    #[test]
    fn test_scope_drop_without_complete() {
        let scope = ObservationScope::begin("test");
        drop(scope);
    }
}
