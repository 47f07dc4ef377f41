//! Cross-field validator
//!
//! Invariants are evaluated in declaration order over the type-checked,
//! pre-normalization field values. The first failing invariant is reported.
//! An invariant whose operands are absent is skipped, except for the
//! dependent side of `required_if`.

use std::cmp::Ordering;

use serde_json::{Map, Value};
use subtle::ConstantTimeEq;

use super::errors::{ValidationError, ValidationResult};
use super::value::{compare_typed, is_missing, values_equal};
use crate::schema::{CompareOp, Condition, FieldType, Invariant, InvariantRule, Schema};

pub struct CrossFieldValidator<'a> {
    schema: &'a Schema,
}

impl<'a> CrossFieldValidator<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// Checks every invariant of the schema against `fields`.
    pub fn validate(&self, fields: &Map<String, Value>) -> ValidationResult<()> {
        for invariant in &self.schema.invariants {
            self.check(invariant, fields)?;
        }
        Ok(())
    }

    fn check(&self, invariant: &Invariant, fields: &Map<String, Value>) -> ValidationResult<()> {
        let present = |name: &str| fields.get(name).filter(|v| !v.is_null());
        let violated = || Err(ValidationError::invariant(&invariant.id, invariant.reason()));

        match &invariant.rule {
            InvariantRule::Ordering {
                before,
                after,
                strict,
            } => {
                let (Some(a), Some(b)) = (present(before), present(after)) else {
                    return Ok(());
                };
                let ordering = compare_typed(a, b, self.field_type(before));
                let holds = match ordering {
                    Some(Ordering::Less) => true,
                    Some(Ordering::Equal) => !strict,
                    _ => false,
                };
                if !holds {
                    return violated();
                }
            }
            InvariantRule::Equal { left, right } => match (present(left), present(right)) {
                (None, None) => {}
                (Some(a), Some(b)) if secure_equal(a, b) => {}
                _ => return violated(),
            },
            InvariantRule::NotEqual { left, right } => {
                if let (Some(a), Some(b)) = (present(left), present(right)) {
                    if values_equal(a, b) {
                        return violated();
                    }
                }
            }
            InvariantRule::RequiredIf {
                field,
                condition,
                then_required,
            } => {
                let Some(value) = present(field) else {
                    return Ok(());
                };
                if condition_holds(value, condition, self.field_type(field))
                    && is_missing(fields.get(then_required.as_str()))
                {
                    return violated();
                }
            }
        }

        Ok(())
    }

    fn field_type(&self, name: &str) -> &FieldType {
        self.schema
            .field_def(name)
            .map(|f| &f.field_type)
            .unwrap_or(&FieldType::String)
    }
}

/// Strings are compared in constant time; they may be secrets.
fn secure_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::String(x), Value::String(y)) => x.as_bytes().ct_eq(y.as_bytes()).into(),
        _ => values_equal(a, b),
    }
}

fn condition_holds(value: &Value, condition: &Condition, field_type: &FieldType) -> bool {
    match condition.op {
        CompareOp::Eq => return values_equal(value, &condition.value),
        CompareOp::Ne => return !values_equal(value, &condition.value),
        _ => {}
    }
    let Some(ordering) = compare_typed(value, &condition.value, field_type) else {
        return false;
    };
    match condition.op {
        CompareOp::Gt => ordering == Ordering::Greater,
        CompareOp::Ge => ordering != Ordering::Less,
        CompareOp::Lt => ordering == Ordering::Less,
        CompareOp::Le => ordering != Ordering::Greater,
        CompareOp::Eq | CompareOp::Ne => false,
    }
}
