//! Field validator
//!
//! Applies one constraint to one already type-checked field value.
//! Constraints never modify the value.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use super::errors::{ValidationError, ValidationResult};
use super::value::{json_type_name, values_equal};
use crate::schema::{CompiledSchema, Constraint};

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
static URL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9-.]+$").expect("email regex")
    })
}

fn url_regex() -> &'static Regex {
    URL_RE.get_or_init(|| {
        Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.\-]*://[^\s/?#]+(?:[/?#]\S*)?$").expect("url regex")
    })
}

/// Checks constraints against values of one schema.
pub struct FieldValidator<'a> {
    schema: &'a CompiledSchema,
}

impl<'a> FieldValidator<'a> {
    pub fn new(schema: &'a CompiledSchema) -> Self {
        Self { schema }
    }

    /// Validates `value` of field `field` against `constraint`.
    pub fn validate(
        &self,
        field: &str,
        value: &Value,
        constraint: &Constraint,
    ) -> ValidationResult<()> {
        let fail = |default: String| constraint.message().map(str::to_string).unwrap_or(default);

        match constraint {
            Constraint::Range {
                min,
                max,
                min_exclusive,
                max_exclusive,
                ..
            } => {
                let n = value.as_f64().ok_or_else(|| {
                    ValidationError::type_mismatch(field, "number", json_type_name(value))
                })?;
                let below = min.is_some_and(|lo| if *min_exclusive { n <= lo } else { n < lo });
                let above = max.is_some_and(|hi| if *max_exclusive { n >= hi } else { n > hi });
                if below || above {
                    return Err(ValidationError::OutOfRange {
                        field: field.to_string(),
                        message: fail(range_message(*min, *max, *min_exclusive, *max_exclusive)),
                    });
                }
            }
            Constraint::Length { min, max, .. } => {
                let size = match value {
                    Value::String(s) => s.chars().count(),
                    Value::Array(items) => items.len(),
                    Value::Object(entries) => entries.len(),
                    other => {
                        return Err(ValidationError::type_mismatch(
                            field,
                            "string, array or map",
                            json_type_name(other),
                        ))
                    }
                };
                let short = min.is_some_and(|lo| size < lo);
                let long = max.is_some_and(|hi| size > hi);
                if short || long {
                    return Err(ValidationError::InvalidLength {
                        field: field.to_string(),
                        message: fail(length_message(*min, *max, size)),
                    });
                }
            }
            Constraint::Pattern { regex, .. } => {
                let s = self.expect_str(field, value)?;
                let matched = match self.schema.pattern(regex) {
                    Some(compiled) => compiled.is_match(s),
                    None => Regex::new(regex).map(|r| r.is_match(s)).unwrap_or(false),
                };
                if !matched {
                    return Err(pattern_mismatch(
                        field,
                        fail(format!("must match pattern '{}'", regex)),
                    ));
                }
            }
            Constraint::Email { .. } => {
                let s = self.expect_str(field, value)?;
                if !email_regex().is_match(s) {
                    return Err(pattern_mismatch(
                        field,
                        fail("must be a valid email address".into()),
                    ));
                }
            }
            Constraint::Url { .. } => {
                let s = self.expect_str(field, value)?;
                if !url_regex().is_match(s) {
                    return Err(pattern_mismatch(field, fail("must be a valid URL".into())));
                }
            }
            Constraint::EmailDomain { domains, .. } => {
                let s = self.expect_str(field, value)?;
                let host = s.rsplit_once('@').map(|(_, host)| host).unwrap_or(s);
                let allowed = domains.iter().any(|d| {
                    host.eq_ignore_ascii_case(d)
                        || host
                            .to_ascii_lowercase()
                            .ends_with(&format!(".{}", d.to_ascii_lowercase()))
                });
                if !allowed {
                    return Err(pattern_mismatch(
                        field,
                        fail(format!(
                            "Email must end with one of the following domains: {}",
                            domains.join(", ")
                        )),
                    ));
                }
            }
            Constraint::CharClasses {
                letter,
                digit,
                uppercase,
                lowercase,
                special,
                ..
            } => {
                let s = self.expect_str(field, value)?;
                let checks: [(bool, fn(char) -> bool, &str); 5] = [
                    (*letter, |c| c.is_alphabetic(), "a letter"),
                    (*digit, |c| c.is_ascii_digit(), "a digit"),
                    (*uppercase, |c| c.is_uppercase(), "an uppercase letter"),
                    (*lowercase, |c| c.is_lowercase(), "a lowercase letter"),
                    (*special, |c| !c.is_alphanumeric(), "a special character"),
                ];
                for (wanted, class, name) in checks {
                    if wanted && !s.chars().any(class) {
                        return Err(pattern_mismatch(
                            field,
                            fail(format!("must contain at least {}", name)),
                        ));
                    }
                }
            }
            Constraint::Enum { values, .. } => {
                if !values.iter().any(|allowed| values_equal(allowed, value)) {
                    let listed: Vec<String> = values.iter().map(Value::to_string).collect();
                    return Err(ValidationError::InvalidEnumValue {
                        field: field.to_string(),
                        message: fail(format!("must be one of {}", listed.join(", "))),
                    });
                }
            }
        }

        Ok(())
    }

    fn expect_str<'v>(&self, field: &str, value: &'v Value) -> ValidationResult<&'v str> {
        value
            .as_str()
            .ok_or_else(|| ValidationError::type_mismatch(field, "string", json_type_name(value)))
    }
}

fn pattern_mismatch(field: &str, message: String) -> ValidationError {
    ValidationError::PatternMismatch {
        field: field.to_string(),
        message,
    }
}

fn range_message(min: Option<f64>, max: Option<f64>, min_ex: bool, max_ex: bool) -> String {
    let lo = min.map(|v| format!("{} {}", if min_ex { ">" } else { ">=" }, v));
    let hi = max.map(|v| format!("{} {}", if max_ex { "<" } else { "<=" }, v));
    match (lo, hi) {
        (Some(lo), Some(hi)) => format!("must be {} and {}", lo, hi),
        (Some(bound), None) | (None, Some(bound)) => format!("must be {}", bound),
        (None, None) => "out of range".to_string(),
    }
}

fn length_message(min: Option<usize>, max: Option<usize>, actual: usize) -> String {
    match (min, max) {
        (Some(lo), Some(hi)) => format!("length {} not within {}..={}", actual, lo, hi),
        (Some(lo), None) => format!("length {} below minimum {}", actual, lo),
        (None, Some(hi)) => format!("length {} above maximum {}", actual, hi),
        (None, None) => format!("invalid length {}", actual),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDef, Schema};
    use serde_json::json;

    fn compiled() -> CompiledSchema {
        CompiledSchema::compile(
            Schema::new("employee", "1").field(
                FieldDef::required_string("name").constraint(Constraint::pattern("^[a-zA-Z ]*$")),
            ),
        )
        .unwrap()
    }

    #[test]
    fn test_range_inclusive_bounds() {
        let schema = compiled();
        let v = FieldValidator::new(&schema);
        let c = Constraint::range(0.0, 120.0);

        assert!(v.validate("age", &json!(0), &c).is_ok());
        assert!(v.validate("age", &json!(120), &c).is_ok());
        let err = v.validate("age", &json!(121), &c).unwrap_err();
        assert_eq!(err.code(), "RECORD_OUT_OF_RANGE");
        assert!(v.validate("age", &json!(-1), &c).is_err());
    }

    #[test]
    fn test_range_exclusive_bound() {
        let schema = compiled();
        let v = FieldValidator::new(&schema);
        let c = Constraint::greater_than(1000.0);

        assert!(v.validate("salary", &json!(1000.5), &c).is_ok());
        let err = v.validate("salary", &json!(1000), &c).unwrap_err();
        assert!(err.to_string().contains("> 1000"));
    }

    #[test]
    fn test_length_counts_chars_and_items() {
        let schema = compiled();
        let v = FieldValidator::new(&schema);
        let c = Constraint::length(3, 5);

        assert!(v.validate("u", &json!("añb"), &c).is_ok());
        assert!(v.validate("u", &json!("ab"), &c).is_err());
        assert!(v.validate("l", &json!([1, 2, 3, 4, 5]), &c).is_ok());
        let err = v.validate("l", &json!([1, 2, 3, 4, 5, 6]), &c).unwrap_err();
        assert_eq!(err.code(), "RECORD_INVALID_LENGTH");
    }

    #[test]
    fn test_pattern_uses_compiled_regex() {
        let schema = compiled();
        let v = FieldValidator::new(&schema);
        let c = Constraint::pattern("^[a-zA-Z ]*$");

        assert!(v.validate("name", &json!("John Doe"), &c).is_ok());
        let err = v.validate("name", &json!("John D0e"), &c).unwrap_err();
        assert_eq!(err.code(), "RECORD_PATTERN_MISMATCH");
    }

    #[test]
    fn test_email_and_url_shapes() {
        let schema = compiled();
        let v = FieldValidator::new(&schema);

        assert!(v.validate("e", &json!("jeevan@gmail.com"), &Constraint::email()).is_ok());
        assert!(v.validate("e", &json!("not-an-email"), &Constraint::email()).is_err());
        assert!(v
            .validate("u", &json!("https://www.linkedin.com/in/johndoe"), &Constraint::url())
            .is_ok());
        assert!(v.validate("u", &json!("linkedin.com/in"), &Constraint::url()).is_err());
    }

    #[test]
    fn test_email_domain() {
        let schema = compiled();
        let v = FieldValidator::new(&schema);
        let c = Constraint::email_domain(["icici.com", "hdfc.com"]);

        assert!(v.validate("email", &json!("john@icici.com"), &c).is_ok());
        assert!(v.validate("email", &json!("john@mail.hdfc.com"), &c).is_ok());
        let err = v.validate("email", &json!("john@evilicici.com"), &c).unwrap_err();
        assert!(err.to_string().contains("icici.com, hdfc.com"));
    }

    #[test]
    fn test_char_classes() {
        let schema = compiled();
        let v = FieldValidator::new(&schema);
        let c = Constraint::letters_and_digits();

        assert!(v.validate("pw", &json!("password123"), &c).is_ok());
        let err = v.validate("pw", &json!("password"), &c).unwrap_err();
        assert!(err.to_string().contains("digit"));
        assert!(v.validate("pw", &json!("12345678"), &c).is_err());
    }

    #[test]
    fn test_enum_membership() {
        let schema = compiled();
        let v = FieldValidator::new(&schema);
        let c = Constraint::one_of(["video", "article", "quiz"]);

        assert!(v.validate("lesson_type", &json!("quiz"), &c).is_ok());
        let err = v.validate("lesson_type", &json!("podcast"), &c).unwrap_err();
        assert_eq!(err.code(), "RECORD_INVALID_ENUM_VALUE");
    }

    #[test]
    fn test_custom_message() {
        let schema = compiled();
        let v = FieldValidator::new(&schema);
        let c = Constraint::min_length(4).with_message("Username must be 4 characters");

        let err = v.validate("username", &json!("abc"), &c).unwrap_err();
        assert_eq!(
            err.to_string(),
            "field 'username': Username must be 4 characters"
        );
    }
}
