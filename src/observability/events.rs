//! Observable events for recordkit
//!
//! Events are explicit and typed. The validation path itself emits none;
//! failures go back to the caller.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Engine configuration loaded from disk
    ConfigLoaded,

    // Registry
    /// A schema was registered for a new type name
    SchemaRegistered,
    /// A schema replaced an existing registration
    SchemaReplaced,
    /// A schema file could not be registered
    SchemaRejected,
    /// A schema directory was loaded
    SchemasLoaded,
    /// A schema was written to disk
    SchemaSaved,
    /// The process-wide registry was installed
    RegistryInstalled,

    // Trees
    /// A record tree was resolved
    TreeResolved,
}

impl Event {
    /// Returns the event name as written to the log
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::SchemaRegistered => "SCHEMA_REGISTERED",
            Event::SchemaReplaced => "SCHEMA_REPLACED",
            Event::SchemaRejected => "SCHEMA_REJECTED",
            Event::SchemasLoaded => "SCHEMAS_LOADED",
            Event::SchemaSaved => "SCHEMA_SAVED",
            Event::RegistryInstalled => "REGISTRY_INSTALLED",
            Event::TreeResolved => "TREE_RESOLVED",
        }
    }

    /// Whether this event reports a failure
    pub fn is_failure(&self) -> bool {
        matches!(self, Event::SchemaRejected)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(Event::SchemaRegistered.as_str(), "SCHEMA_REGISTERED");
        assert_eq!(Event::TreeResolved.to_string(), "TREE_RESOLVED");
    }

    #[test]
    fn test_failure_events() {
        assert!(Event::SchemaRejected.is_failure());
        assert!(!Event::SchemasLoaded.is_failure());
    }
}
