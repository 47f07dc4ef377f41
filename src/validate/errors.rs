//! Validation error taxonomy
//!
//! Every failure is local and recoverable by the caller. Validation is
//! fail-fast: the first violation in declaration order is returned.

use thiserror::Error;

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// A record failed validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Required field absent, null or empty
    #[error("field '{field}' is required")]
    MissingField { field: String },

    /// Value has the wrong JSON type
    #[error("field '{field}': expected {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: String,
        actual: String,
    },

    /// Input carries a key the schema does not declare
    #[error("field '{field}' is not declared by the schema")]
    UnknownField { field: String },

    /// Numeric value outside its bounds
    #[error("field '{field}': {message}")]
    OutOfRange { field: String, message: String },

    /// String, array or map size outside its bounds
    #[error("field '{field}': {message}")]
    InvalidLength { field: String, message: String },

    /// Value does not have the declared shape
    #[error("field '{field}': {message}")]
    PatternMismatch { field: String, message: String },

    /// Value not in the allowed set
    #[error("field '{field}': {message}")]
    InvalidEnumValue { field: String, message: String },

    /// Cross-field invariant failed
    #[error("invariant '{invariant}' violated: {reason}")]
    InvariantViolation { invariant: String, reason: String },

    /// A node is its own ancestor
    #[error("cyclic reference at node {id}")]
    CyclicReference { id: String },

    /// Nesting deeper than the configured maximum
    #[error("'{path}' exceeds maximum depth {max_depth}")]
    DepthExceeded { path: String, max_depth: usize },

    /// A parent id matches no node
    #[error("node {id} references missing parent {parent}")]
    DanglingReference { id: String, parent: String },

    /// No schema registered under this name
    #[error("unknown record type '{type_name}'")]
    UnknownType { type_name: String },

    /// Tree operation on a type without a tree spec
    #[error("record type '{type_name}' is not recursive")]
    NotRecursive { type_name: String },

    /// A normalization backend failed
    #[error("field '{field}': transform failed: {reason}")]
    TransformFailed { field: String, reason: String },
}

impl ValidationError {
    pub fn missing(field: impl Into<String>) -> Self {
        ValidationError::MissingField {
            field: field.into(),
        }
    }

    pub fn type_mismatch(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        ValidationError::TypeMismatch {
            field: field.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn invariant(invariant: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvariantViolation {
            invariant: invariant.into(),
            reason: reason.into(),
        }
    }

    pub fn unknown_type(type_name: impl Into<String>) -> Self {
        ValidationError::UnknownType {
            type_name: type_name.into(),
        }
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::MissingField { .. } => "RECORD_MISSING_FIELD",
            ValidationError::TypeMismatch { .. } => "RECORD_TYPE_MISMATCH",
            ValidationError::UnknownField { .. } => "RECORD_UNKNOWN_FIELD",
            ValidationError::OutOfRange { .. } => "RECORD_OUT_OF_RANGE",
            ValidationError::InvalidLength { .. } => "RECORD_INVALID_LENGTH",
            ValidationError::PatternMismatch { .. } => "RECORD_PATTERN_MISMATCH",
            ValidationError::InvalidEnumValue { .. } => "RECORD_INVALID_ENUM_VALUE",
            ValidationError::InvariantViolation { .. } => "RECORD_INVARIANT_VIOLATION",
            ValidationError::CyclicReference { .. } => "RECORD_CYCLIC_REFERENCE",
            ValidationError::DepthExceeded { .. } => "RECORD_DEPTH_EXCEEDED",
            ValidationError::DanglingReference { .. } => "RECORD_DANGLING_REFERENCE",
            ValidationError::UnknownType { .. } => "RECORD_UNKNOWN_TYPE",
            ValidationError::NotRecursive { .. } => "RECORD_NOT_RECURSIVE",
            ValidationError::TransformFailed { .. } => "RECORD_TRANSFORM_FAILED",
        }
    }

    /// Field path for field-scoped failures
    pub fn field(&self) -> Option<&str> {
        match self {
            ValidationError::MissingField { field }
            | ValidationError::TypeMismatch { field, .. }
            | ValidationError::UnknownField { field }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::InvalidLength { field, .. }
            | ValidationError::PatternMismatch { field, .. }
            | ValidationError::InvalidEnumValue { field, .. }
            | ValidationError::TransformFailed { field, .. } => Some(field.as_str()),
            ValidationError::DepthExceeded { path, .. } => Some(path.as_str()),
            _ => None,
        }
    }

    /// Invariant identifier for invariant failures
    pub fn invariant_id(&self) -> Option<&str> {
        match self {
            ValidationError::InvariantViolation { invariant, .. } => Some(invariant.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct() {
        let errors = [
            ValidationError::missing("a"),
            ValidationError::type_mismatch("a", "int", "string"),
            ValidationError::invariant("dates", "bad"),
            ValidationError::unknown_type("ghost"),
            ValidationError::CyclicReference { id: "1".into() },
        ];
        let mut codes: Vec<_> = errors.iter().map(|e| e.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_field_accessor() {
        assert_eq!(ValidationError::missing("name").field(), Some("name"));
        assert_eq!(ValidationError::invariant("dates", "x").field(), None);
        assert_eq!(
            ValidationError::invariant("dates", "x").invariant_id(),
            Some("dates")
        );
    }

    #[test]
    fn test_display() {
        let err = ValidationError::type_mismatch("age", "int", "string");
        assert_eq!(err.to_string(), "field 'age': expected int, got string");
    }
}
