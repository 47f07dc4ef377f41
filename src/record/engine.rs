//! Record validation pipeline
//!
//! For one record, in order:
//! 1. Reject undeclared keys (per `unknown_fields` policy)
//! 2. Per field, in declaration order: presence, defaults, type check,
//!    constraints. Nested records run the whole pipeline one level deeper
//! 3. Cross-field invariants over the pre-normalization values
//! 4. Normalizations; transient fields are dropped
//!
//! The first failure is returned. Nothing is logged on this path.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Number, Value};

use super::model::Record;
use crate::config::{EngineConfig, UnknownFieldPolicy};
use crate::schema::{DefaultValue, FieldDef, FieldType, SchemaRegistry};
use crate::validate::{
    display_path, format_datetime, index_path, is_missing, json_type_name, make_path,
    parse_datetime, transform, CrossFieldValidator, FieldValidator, ValidationError,
    ValidationResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Raw input: full pipeline
    Validate,
    /// Previously stored output: types and declared fields only
    Restore,
}

/// Validates raw input against registered schemas.
///
/// Holds a shared borrow of the registry; any number of validators may run
/// concurrently over one registry.
#[derive(Debug, Clone)]
pub struct RecordValidator<'a> {
    registry: &'a SchemaRegistry,
    config: EngineConfig,
}

impl<'a> RecordValidator<'a> {
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self {
            registry,
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn registry(&self) -> &'a SchemaRegistry {
        self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Validates `raw` as a record of type `type_name`.
    pub fn validate(&self, type_name: &str, raw: &Value) -> ValidationResult<Record> {
        self.validate_at(type_name, raw, "", 0)
    }

    /// Rebuilds a record from `Record::to_value` output.
    ///
    /// Field types and declared names are checked; constraints, invariants
    /// and normalizations are not re-run, so hashed values survive intact.
    pub fn restore(&self, type_name: &str, stored: &Value) -> ValidationResult<Record> {
        self.run(type_name, stored, "", 0, Mode::Restore)
    }

    pub(crate) fn validate_at(
        &self,
        type_name: &str,
        raw: &Value,
        path: &str,
        depth: usize,
    ) -> ValidationResult<Record> {
        self.run(type_name, raw, path, depth, Mode::Validate)
    }

    fn run(
        &self,
        type_name: &str,
        raw: &Value,
        path: &str,
        depth: usize,
        mode: Mode,
    ) -> ValidationResult<Record> {
        if depth > self.config.max_depth {
            return Err(ValidationError::DepthExceeded {
                path: display_path(path),
                max_depth: self.config.max_depth,
            });
        }

        let compiled = Arc::clone(self.registry.lookup(type_name)?);
        let schema = compiled.schema();

        let Value::Object(input) = raw else {
            return Err(ValidationError::type_mismatch(
                display_path(path),
                "object",
                json_type_name(raw),
            ));
        };

        if self.config.unknown_fields == UnknownFieldPolicy::Reject {
            if let Some(key) = input.keys().find(|k| schema.field_def(k).is_none()) {
                return Err(ValidationError::UnknownField {
                    field: make_path(path, key),
                });
            }
        }

        let field_validator = FieldValidator::new(&compiled);
        let mut checked = Map::new();

        for def in &schema.fields {
            if mode == Mode::Restore && def.transient {
                continue;
            }
            let field_path = make_path(path, &def.name);

            let value = match input.get(&def.name).filter(|v| !v.is_null()) {
                Some(v) => {
                    if mode == Mode::Validate && def.required && is_missing(Some(v)) {
                        return Err(ValidationError::missing(field_path));
                    }
                    let normalized = self.check_value(&field_path, v, &def.field_type, depth, mode)?;
                    if mode == Mode::Validate {
                        for constraint in &def.constraints {
                            field_validator.validate(&field_path, &normalized, constraint)?;
                        }
                    }
                    normalized
                }
                None => match self.default_for(def, mode) {
                    Some(default) => {
                        self.check_value(&field_path, &default, &def.field_type, depth, mode)?
                    }
                    None if def.required => return Err(ValidationError::missing(field_path)),
                    None => continue,
                },
            };

            checked.insert(def.name.clone(), value);
        }

        if mode == Mode::Validate {
            CrossFieldValidator::new(schema).validate(&checked)?;
        }

        let mut stored = Map::new();
        for def in &schema.fields {
            let Some(value) = checked.remove(&def.name) else {
                continue;
            };
            if def.transient {
                continue;
            }
            let value = match mode {
                Mode::Validate => {
                    transform::apply_all(&make_path(path, &def.name), value, &def.transforms)?
                }
                Mode::Restore => value,
            };
            stored.insert(def.name.clone(), value);
        }

        Ok(Record::new(compiled, stored))
    }

    fn default_for(&self, def: &FieldDef, mode: Mode) -> Option<Value> {
        if mode == Mode::Restore {
            return None;
        }
        match def.default.as_ref()? {
            DefaultValue::Value(v) => Some(v.clone()),
            DefaultValue::Now => Some(Value::String(format_datetime(&Utc::now()))),
        }
    }

    /// Type-checks one value and returns its stored form.
    fn check_value(
        &self,
        path: &str,
        value: &Value,
        field_type: &FieldType,
        depth: usize,
        mode: Mode,
    ) -> ValidationResult<Value> {
        let mismatch =
            || ValidationError::type_mismatch(path, field_type.type_name(), json_type_name(value));

        match field_type {
            FieldType::String if value.is_string() => Ok(value.clone()),
            FieldType::Int if value.is_i64() || value.is_u64() => Ok(value.clone()),
            FieldType::Float => value
                .as_f64()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(mismatch),
            FieldType::Bool if value.is_boolean() => Ok(value.clone()),
            FieldType::Datetime => value
                .as_str()
                .and_then(parse_datetime)
                .map(|dt| Value::String(format_datetime(&dt)))
                .ok_or_else(mismatch),
            FieldType::Record { record_type } => self
                .run(record_type, value, path, depth + 1, mode)
                .map(Record::into_value),
            FieldType::Array { element_type } => {
                let items = value.as_array().ok_or_else(mismatch)?;
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        self.check_value(&index_path(path, i), item, element_type, depth, mode)
                    })
                    .collect::<ValidationResult<Vec<_>>>()
                    .map(Value::Array)
            }
            FieldType::Map { value_type } => {
                let entries = value.as_object().ok_or_else(mismatch)?;
                entries
                    .iter()
                    .map(|(key, item)| {
                        self.check_value(&make_path(path, key), item, value_type, depth, mode)
                            .map(|v| (key.clone(), v))
                    })
                    .collect::<ValidationResult<Map<_, _>>>()
                    .map(Value::Object)
            }
            _ => Err(mismatch()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Constraint, Invariant, Schema, Transform};
    use crate::validate::verify_secret;
    use serde_json::json;

    fn registry() -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        registry
            .register(
                Schema::new("address", "1")
                    .field(FieldDef::required_string("street"))
                    .field(FieldDef::required_string("city"))
                    .field(
                        FieldDef::required_string("zip_code")
                            .constraint(Constraint::pattern(r"^\d{6}$")),
                    ),
            )
            .unwrap();
        registry
            .register(
                Schema::new("signup", "1")
                    .field(
                        FieldDef::required_string("username")
                            .constraint(Constraint::min_length(4))
                            .transform(Transform::Trim),
                    )
                    .field(
                        FieldDef::required_string("password")
                            .constraint(Constraint::min_length(8))
                            .transform(Transform::OneWayHash),
                    )
                    .field(FieldDef::required_string("confirm_password").transient())
                    .field(FieldDef::bool_with_default("newsletter", false))
                    .field(FieldDef::datetime_now("created_at"))
                    .invariant(Invariant::equal(
                        "password_match",
                        "password",
                        "confirm_password",
                    )),
            )
            .unwrap();
        registry
            .register(
                Schema::new("profile", "1")
                    .field(FieldDef::required_string("name"))
                    .field(FieldDef::optional_record("address", "address"))
                    .field(FieldDef::list_of("scores", FieldType::Float))
                    .field(FieldDef::new(
                        "settings",
                        FieldType::map_of(FieldType::String),
                    )),
            )
            .unwrap();
        registry
            .register(
                Schema::new("chain", "1")
                    .field(FieldDef::required_int("id"))
                    .field(FieldDef::optional_record("next", "chain")),
            )
            .unwrap();
        registry
    }

    fn signup_input() -> Value {
        json!({
            "username": "  jeevan ",
            "password": "password123",
            "confirm_password": "password123"
        })
    }

    #[test]
    fn test_pipeline_order() {
        let registry = registry();
        let validator = RecordValidator::new(&registry);
        let record = validator.validate("signup", &signup_input()).unwrap();

        assert_eq!(record.get("username"), Some(&json!("jeevan")));
        assert!(record.get("confirm_password").is_none());
        assert_eq!(record.get("newsletter"), Some(&json!(false)));
        assert!(record.get("created_at").unwrap().as_str().unwrap().ends_with('Z'));

        let hashed = record.get("password").unwrap().as_str().unwrap();
        assert!(verify_secret("password123", hashed));
    }

    #[test]
    fn test_invariant_sees_raw_values() {
        let registry = registry();
        let validator = RecordValidator::new(&registry);
        let mut input = signup_input();
        input["confirm_password"] = json!("password124");

        let err = validator.validate("signup", &input).unwrap_err();
        assert_eq!(err.invariant_id(), Some("password_match"));
    }

    #[test]
    fn test_field_errors_precede_invariants() {
        let registry = registry();
        let validator = RecordValidator::new(&registry);
        let input = json!({
            "username": "abc",
            "password": "password123",
            "confirm_password": "different"
        });

        let err = validator.validate("signup", &input).unwrap_err();
        assert_eq!(err.code(), "RECORD_INVALID_LENGTH");
        assert_eq!(err.field(), Some("username"));
    }

    #[test]
    fn test_nested_paths() {
        let registry = registry();
        let validator = RecordValidator::new(&registry);

        let err = validator
            .validate(
                "profile",
                &json!({
                    "name": "John",
                    "address": { "street": "1 Main", "city": "Pune", "zip_code": "4110" }
                }),
            )
            .unwrap_err();
        assert_eq!(err.field(), Some("address.zip_code"));

        let err = validator
            .validate("profile", &json!({ "name": "John", "scores": [1.5, "x"] }))
            .unwrap_err();
        assert_eq!(err.field(), Some("scores[1]"));

        let err = validator
            .validate("profile", &json!({ "name": "John", "settings": { "theme": 3 } }))
            .unwrap_err();
        assert_eq!(err.field(), Some("settings.theme"));
    }

    #[test]
    fn test_float_accepts_integers() {
        let registry = registry();
        let validator = RecordValidator::new(&registry);
        let record = validator
            .validate("profile", &json!({ "name": "John", "scores": [70, 1.5] }))
            .unwrap();
        assert_eq!(record.get("scores"), Some(&json!([70.0, 1.5])));
    }

    #[test]
    fn test_unknown_field_policy() {
        let registry = registry();
        let strict = RecordValidator::new(&registry);
        let input = json!({ "name": "John", "nickname": "JJ" });

        let err = strict.validate("profile", &input).unwrap_err();
        assert_eq!(err.code(), "RECORD_UNKNOWN_FIELD");

        let lenient = RecordValidator::new(&registry).with_config(
            EngineConfig::default().with_unknown_fields(UnknownFieldPolicy::Ignore),
        );
        let record = lenient.validate("profile", &input).unwrap();
        assert!(record.get("nickname").is_none());
    }

    #[test]
    fn test_depth_bound_on_nested_records() {
        let registry = registry();
        let validator = RecordValidator::new(&registry)
            .with_config(EngineConfig::default().with_max_depth(2));

        let ok = json!({ "id": 1, "next": { "id": 2, "next": { "id": 3 } } });
        assert!(validator.validate("chain", &ok).is_ok());

        let deep = json!({ "id": 1, "next": { "id": 2, "next": { "id": 3, "next": { "id": 4 } } } });
        let err = validator.validate("chain", &deep).unwrap_err();
        assert_eq!(
            err,
            ValidationError::DepthExceeded {
                path: "next.next.next".into(),
                max_depth: 2
            }
        );
    }

    #[test]
    fn test_unknown_type() {
        let registry = registry();
        let err = RecordValidator::new(&registry)
            .validate("ghost", &json!({}))
            .unwrap_err();
        assert_eq!(err, ValidationError::unknown_type("ghost"));
    }

    #[test]
    fn test_non_object_input() {
        let registry = registry();
        let err = RecordValidator::new(&registry)
            .validate("address", &json!([1, 2]))
            .unwrap_err();
        assert_eq!(err.field(), Some("$root"));
    }

    #[test]
    fn test_restore_is_lossless() {
        let registry = registry();
        let validator = RecordValidator::new(&registry);
        let record = validator.validate("signup", &signup_input()).unwrap();

        let stored = record.to_value();
        let restored = validator.restore("signup", &stored).unwrap();
        assert_eq!(restored, record);

        // Hashing again would produce a different value.
        let revalidated = validator.validate("signup", &signup_input()).unwrap();
        assert_ne!(revalidated.get("password"), record.get("password"));
    }
}
