//! Observability for recordkit
//!
//! Structured JSON-lines logging of registry, configuration and tree
//! lifecycle events.
//!
//! # Usage
//!
//! ```ignore
//! use recordkit::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::SchemaRegistered, &[("type", "patient")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    match severity_of(event) {
        Severity::Warn => Logger::warn(event.as_str(), fields),
        _ => Logger::info(event.as_str(), fields),
    }
}

/// Failures are warnings; everything else is informational.
fn severity_of(event: Event) -> Severity {
    if event.is_failure() {
        Severity::Warn
    } else {
        Severity::Info
    }
}

#[cfg(test)]
mod tests {
    use super::logger::capture_log;
    use super::*;

    #[test]
    fn test_event_severity() {
        assert_eq!(severity_of(Event::SchemaRejected), Severity::Warn);
        assert_eq!(severity_of(Event::SchemasLoaded), Severity::Info);
    }

    #[test]
    fn test_event_line() {
        let event = Event::SchemasLoaded;
        let line = capture_log(severity_of(event), event.as_str(), &[("count", "2")]);

        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["event"], "SCHEMAS_LOADED");
        assert_eq!(parsed["severity"], "INFO");
        assert_eq!(parsed["count"], "2");
    }
}
