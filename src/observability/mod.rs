//! Observability for inspectdb
//!
//! - Structured logging (JSON lines on stderr)
//! - Typed lifecycle events
//! - Query scopes with elapsed time
//!
//! # Usage
//!
//! ```ignore
//! use inspectdb::observability::{log_event_with_fields, Event, Logger};
//!
//! Logger::info("QUERY_COMPLETE", &[("rows", "42")]);
//! log_event_with_fields(Event::ValidatorInstalled, &[("collection", "restaurants")]);
//! ```

mod events;
mod logger;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use scope::ObservationScope;

/// Log a lifecycle event
pub fn log_event(event: Event) {
    log_event_with_fields(event, &[]);
}

/// Log a lifecycle event with fields, at the event's severity
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
