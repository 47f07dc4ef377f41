//! Structured JSON logger for recordkit
//!
//! - One log line = one event
//! - `event` and `severity` first, remaining keys sorted
//! - Synchronous, no buffering
//! - Process-wide minimum severity

use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::{AtomicU8, Ordering};

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Debug-level detail
    Trace = 0,
    /// Normal operations
    Info = 1,
    /// Recoverable issues
    Warn = 2,
    /// Operation failures
    Error = 3,
}

impl Severity {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        }
    }

    /// Parses a configuration level name (`trace`, `info`, `warn`, `error`).
    pub fn from_level(level: &str) -> Option<Self> {
        match level.to_ascii_lowercase().as_str() {
            "trace" => Some(Severity::Trace),
            "info" => Some(Severity::Info),
            "warn" => Some(Severity::Warn),
            "error" => Some(Severity::Error),
            _ => None,
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            0 => Severity::Trace,
            1 => Severity::Info,
            2 => Severity::Warn,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

static MIN_SEVERITY: AtomicU8 = AtomicU8::new(Severity::Info as u8);

/// A structured logger that outputs JSON lines
pub struct Logger;

impl Logger {
    /// Sets the minimum severity emitted by this process.
    pub fn set_min_severity(severity: Severity) {
        MIN_SEVERITY.store(severity as u8, Ordering::Relaxed);
    }

    /// Returns the current minimum severity.
    pub fn min_severity() -> Severity {
        Severity::from_u8(MIN_SEVERITY.load(Ordering::Relaxed))
    }

    /// Returns whether an event at `severity` would be written.
    pub fn enabled(severity: Severity) -> bool {
        severity >= Self::min_severity()
    }

    /// Log an event with the given severity and fields
    pub fn log(severity: Severity, event: &str, fields: &[(&str, &str)]) {
        let min = Self::min_severity();
        if severity >= Severity::Error {
            Self::log_to_writer(min, severity, event, fields, &mut io::stderr());
        } else {
            Self::log_to_writer(min, severity, event, fields, &mut io::stdout());
        }
    }

    /// Writes one line unless `severity` is below `min`. Returns whether it wrote.
    fn log_to_writer<W: Write>(
        min: Severity,
        severity: Severity,
        event: &str,
        fields: &[(&str, &str)],
        writer: &mut W,
    ) -> bool {
        if severity < min {
            return false;
        }
        let line = Self::render(severity, event, fields);
        let _ = writer.write_all(line.as_bytes());
        let _ = writer.flush();
        true
    }

    /// Renders one log line, including the trailing newline.
    fn render(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
        let mut output = String::with_capacity(128);

        output.push_str("{\"event\":\"");
        Self::escape_json_string(&mut output, event);
        output.push_str("\",\"severity\":\"");
        output.push_str(severity.as_str());
        output.push('"');

        let mut sorted_fields: Vec<_> = fields.iter().collect();
        sorted_fields.sort_by_key(|(k, _)| *k);

        for (key, value) in sorted_fields {
            output.push_str(",\"");
            Self::escape_json_string(&mut output, key);
            output.push_str("\":\"");
            Self::escape_json_string(&mut output, value);
            output.push('"');
        }

        output.push_str("}\n");
        output
    }

    fn escape_json_string(output: &mut String, s: &str) {
        for c in s.chars() {
            match c {
                '"' => output.push_str("\\\""),
                '\\' => output.push_str("\\\\"),
                '\n' => output.push_str("\\n"),
                '\r' => output.push_str("\\r"),
                '\t' => output.push_str("\\t"),
                c if c.is_control() => {
                    output.push_str(&format!("\\u{:04x}", c as u32));
                }
                c => output.push(c),
            }
        }
    }

    /// Log at TRACE level
    pub fn trace(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Trace, event, fields);
    }

    /// Log at INFO level
    pub fn info(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Info, event, fields);
    }

    /// Log at WARN level
    pub fn warn(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Warn, event, fields);
    }
}

#[cfg(test)]
pub(crate) fn capture_log(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
    Logger::render(severity, event, fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Trace < Severity::Info);
        assert!(Severity::Info < Severity::Warn);
        assert!(Severity::Warn < Severity::Error);
    }

    #[test]
    fn test_from_level() {
        assert_eq!(Severity::from_level("trace"), Some(Severity::Trace));
        assert_eq!(Severity::from_level("WARN"), Some(Severity::Warn));
        assert_eq!(Severity::from_level("verbose"), None);
    }

    #[test]
    fn test_log_json_format() {
        let output = capture_log(Severity::Info, "SCHEMA_REGISTERED", &[]);

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["event"], "SCHEMA_REGISTERED");
        assert_eq!(parsed["severity"], "INFO");
    }

    #[test]
    fn test_fields_sorted() {
        let output = capture_log(
            Severity::Info,
            "SCHEMAS_LOADED",
            &[("count", "3"), ("dir", "/tmp/schemas")],
        );
        let count_pos = output.find("\"count\"").unwrap();
        let dir_pos = output.find("\"dir\"").unwrap();
        assert!(count_pos < dir_pos);
        assert!(output.ends_with('\n'));
    }

    #[test]
    fn test_below_minimum_not_written() {
        let mut out = Vec::new();
        assert!(!Logger::log_to_writer(
            Severity::Warn,
            Severity::Info,
            "TREE_RESOLVED",
            &[],
            &mut out
        ));
        assert!(out.is_empty());

        assert!(Logger::log_to_writer(
            Severity::Warn,
            Severity::Warn,
            "SCHEMA_REJECTED",
            &[("code", "SCHEMA_PARSE")],
            &mut out
        ));
        let parsed: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed["event"], "SCHEMA_REJECTED");

        let mut trace = Vec::new();
        assert!(Logger::log_to_writer(
            Severity::Trace,
            Severity::Trace,
            "TREE_RESOLVED",
            &[],
            &mut trace
        ));
        assert!(!trace.is_empty());
    }

    #[test]
    fn test_escaping() {
        let output = capture_log(Severity::Warn, "E", &[("msg", "a \"quoted\"\nline")]);
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["msg"], "a \"quoted\"\nline");
    }
}
