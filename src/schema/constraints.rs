//! Field constraints and normalizations
//!
//! Constraints are pure predicates over one field value. Normalizations run
//! only after every predicate on the record has passed.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::types::FieldType;

/// A declarative rule attached to one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Constraint {
    /// Numeric bounds, inclusive unless marked exclusive
    Range {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        min_exclusive: bool,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        max_exclusive: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Size bounds: characters, array items or map entries
    Length {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Regular expression searched in the value; anchor it for a full match
    Pattern {
        regex: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Email address shape
    Email {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Absolute URL shape (`scheme://host...`)
    Url {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Email host must be one of the listed domains or a subdomain of one
    /// (`mail.icici.com` matches `icici.com`; `xicici.com` does not)
    EmailDomain {
        domains: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Character classes the value must contain
    CharClasses {
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        letter: bool,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        digit: bool,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        uppercase: bool,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        lowercase: bool,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        special: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Value must be one of the allowed values
    Enum {
        values: Vec<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl Constraint {
    /// Inclusive range `[min, max]`
    pub fn range(min: f64, max: f64) -> Self {
        Constraint::Range {
            min: Some(min),
            max: Some(max),
            min_exclusive: false,
            max_exclusive: false,
            message: None,
        }
    }

    /// Inclusive lower bound (`ge`)
    pub fn min(min: f64) -> Self {
        Constraint::Range {
            min: Some(min),
            max: None,
            min_exclusive: false,
            max_exclusive: false,
            message: None,
        }
    }

    /// Exclusive lower bound (`gt`)
    pub fn greater_than(min: f64) -> Self {
        Constraint::Range {
            min: Some(min),
            max: None,
            min_exclusive: true,
            max_exclusive: false,
            message: None,
        }
    }

    /// Size bounds `[min, max]`
    pub fn length(min: usize, max: usize) -> Self {
        Constraint::Length {
            min: Some(min),
            max: Some(max),
            message: None,
        }
    }

    /// Minimum size
    pub fn min_length(min: usize) -> Self {
        Constraint::Length {
            min: Some(min),
            max: None,
            message: None,
        }
    }

    /// Maximum size
    pub fn max_length(max: usize) -> Self {
        Constraint::Length {
            min: None,
            max: Some(max),
            message: None,
        }
    }

    /// Regular expression constraint (search semantics)
    pub fn pattern(regex: impl Into<String>) -> Self {
        Constraint::Pattern {
            regex: regex.into(),
            message: None,
        }
    }

    /// Email shape
    pub fn email() -> Self {
        Constraint::Email { message: None }
    }

    /// URL shape
    pub fn url() -> Self {
        Constraint::Url { message: None }
    }

    /// Allowed email domains, matched on whole host labels
    pub fn email_domain<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Constraint::EmailDomain {
            domains: domains.into_iter().map(Into::into).collect(),
            message: None,
        }
    }

    /// Requires at least one letter and one digit
    pub fn letters_and_digits() -> Self {
        Constraint::CharClasses {
            letter: true,
            digit: true,
            uppercase: false,
            lowercase: false,
            special: false,
            message: None,
        }
    }

    /// Allowed values
    pub fn one_of<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Constraint::Enum {
            values: values.into_iter().map(Into::into).collect(),
            message: None,
        }
    }

    /// Replaces the failure message
    pub fn with_message(mut self, text: impl Into<String>) -> Self {
        let text = Some(text.into());
        match &mut self {
            Constraint::Range { message, .. }
            | Constraint::Length { message, .. }
            | Constraint::Pattern { message, .. }
            | Constraint::Email { message }
            | Constraint::Url { message }
            | Constraint::EmailDomain { message, .. }
            | Constraint::CharClasses { message, .. }
            | Constraint::Enum { message, .. } => *message = text,
        }
        self
    }

    /// The declared failure message, if any
    pub fn message(&self) -> Option<&str> {
        match self {
            Constraint::Range { message, .. }
            | Constraint::Length { message, .. }
            | Constraint::Pattern { message, .. }
            | Constraint::Email { message }
            | Constraint::Url { message }
            | Constraint::EmailDomain { message, .. }
            | Constraint::CharClasses { message, .. }
            | Constraint::Enum { message, .. } => message.as_deref(),
        }
    }

    /// Constraint kind name
    pub fn kind(&self) -> &'static str {
        match self {
            Constraint::Range { .. } => "range",
            Constraint::Length { .. } => "length",
            Constraint::Pattern { .. } => "pattern",
            Constraint::Email { .. } => "email",
            Constraint::Url { .. } => "url",
            Constraint::EmailDomain { .. } => "email_domain",
            Constraint::CharClasses { .. } => "char_classes",
            Constraint::Enum { .. } => "enum",
        }
    }

    /// Checks the constraint makes sense on a field of type `field_type`.
    ///
    /// Regex syntax is checked when the registry compiles the schema.
    pub fn check_definition(&self, field_type: &FieldType) -> Result<(), String> {
        match self {
            Constraint::Range { min, max, .. } => {
                if !field_type.is_numeric() {
                    return Err(format!("range on {} field", field_type.type_name()));
                }
                if let (Some(lo), Some(hi)) = (min, max) {
                    if lo > hi {
                        return Err(format!("range min {} exceeds max {}", lo, hi));
                    }
                }
            }
            Constraint::Length { min, max, .. } => {
                if !matches!(
                    field_type,
                    FieldType::String | FieldType::Array { .. } | FieldType::Map { .. }
                ) {
                    return Err(format!("length on {} field", field_type.type_name()));
                }
                if let (Some(lo), Some(hi)) = (min, max) {
                    if lo > hi {
                        return Err(format!("length min {} exceeds max {}", lo, hi));
                    }
                }
            }
            Constraint::Pattern { .. }
            | Constraint::Email { .. }
            | Constraint::Url { .. }
            | Constraint::EmailDomain { .. }
            | Constraint::CharClasses { .. } => {
                if *field_type != FieldType::String {
                    return Err(format!(
                        "{} on {} field",
                        self.kind(),
                        field_type.type_name()
                    ));
                }
                if let Constraint::EmailDomain { domains, .. } = self {
                    if domains.is_empty() {
                        return Err("email_domain needs at least one domain".into());
                    }
                }
            }
            Constraint::Enum { values, .. } => {
                if values.is_empty() {
                    return Err("enum needs at least one value".into());
                }
            }
        }
        Ok(())
    }
}

/// Normalization applied after validation succeeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    /// Unicode uppercase
    Uppercase,
    /// Unicode lowercase
    Lowercase,
    /// Strip leading and trailing whitespace
    Trim,
    /// Salted Argon2id hash; never invertible
    OneWayHash,
}

impl Transform {
    /// Whether applying the transform twice equals applying it once
    pub fn is_idempotent(&self) -> bool {
        !matches!(self, Transform::OneWayHash)
    }
}
