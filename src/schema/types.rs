//! Schema type definitions
//!
//! Supported types:
//! - string: UTF-8 string
//! - int: 64-bit signed integer
//! - float: 64-bit floating point
//! - bool: Boolean
//! - datetime: RFC 3339 / ISO-8601 timestamp
//! - record: nested record of a registered type
//! - array: homogeneous array with element type
//! - map: string-keyed map with homogeneous value type

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::computed::{ComputedField, ComputedKind};
use super::constraints::{Constraint, Transform};
use super::invariants::{Invariant, InvariantRule};

/// Supported field types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldType {
    /// UTF-8 string
    String,
    /// 64-bit signed integer
    Int,
    /// 64-bit floating point (integers accepted)
    Float,
    /// Boolean
    Bool,
    /// Timestamp, normalized to RFC 3339 UTC
    Datetime,
    /// Nested record validated with its own registered schema
    Record {
        /// Registered type name of the nested record
        record_type: String,
    },
    /// Homogeneous array
    Array {
        /// Element type (boxed to allow recursive types)
        element_type: Box<FieldType>,
    },
    /// String-keyed map with homogeneous values
    Map {
        /// Value type
        value_type: Box<FieldType>,
    },
}

impl FieldType {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Bool => "bool",
            FieldType::Datetime => "datetime",
            FieldType::Record { .. } => "record",
            FieldType::Array { .. } => "array",
            FieldType::Map { .. } => "map",
        }
    }

    /// Nested record type
    pub fn record(record_type: impl Into<String>) -> Self {
        FieldType::Record {
            record_type: record_type.into(),
        }
    }

    /// Array of `element`
    pub fn array_of(element: FieldType) -> Self {
        FieldType::Array {
            element_type: Box::new(element),
        }
    }

    /// Map of string keys to `value`
    pub fn map_of(value: FieldType) -> Self {
        FieldType::Map {
            value_type: Box::new(value),
        }
    }

    /// Whether values of this type are numbers
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Int | FieldType::Float)
    }
}

/// Value used when a field is absent or null
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultValue {
    /// Literal JSON value
    Value(Value),
    /// Current UTC timestamp at validation time
    Now,
}

/// Field definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field name
    pub name: String,
    /// Field data type
    #[serde(flatten)]
    pub field_type: FieldType,
    /// Whether field must be present
    #[serde(default)]
    pub required: bool,
    /// Value used when the field is absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultValue>,
    /// Constraints, checked in declaration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Constraint>,
    /// Normalizations, applied in order after validation
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transforms: Vec<Transform>,
    /// Validated and visible to invariants, but never stored
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub transient: bool,
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldDef {
    /// Create an optional field of the given type
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: false,
            default: None,
            constraints: Vec::new(),
            transforms: Vec::new(),
            transient: false,
            description: None,
        }
    }

    /// Create a required string field
    pub fn required_string(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::String).required()
    }

    /// Create an optional string field
    pub fn optional_string(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::String)
    }

    /// Create a required int field
    pub fn required_int(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Int).required()
    }

    /// Create an optional int field
    pub fn optional_int(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Int)
    }

    /// Create a required float field
    pub fn required_float(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Float).required()
    }

    /// Create an optional float field
    pub fn optional_float(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Float)
    }

    /// Create a bool field defaulting to `value`
    pub fn bool_with_default(name: impl Into<String>, value: bool) -> Self {
        Self::new(name, FieldType::Bool).default_value(Value::Bool(value))
    }

    /// Create a required datetime field
    pub fn required_datetime(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Datetime).required()
    }

    /// Create a datetime field defaulting to the validation time
    pub fn datetime_now(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Datetime).default_now()
    }

    /// Create a required nested record field
    pub fn required_record(name: impl Into<String>, record_type: impl Into<String>) -> Self {
        Self::new(name, FieldType::record(record_type)).required()
    }

    /// Create an optional nested record field
    pub fn optional_record(name: impl Into<String>, record_type: impl Into<String>) -> Self {
        Self::new(name, FieldType::record(record_type))
    }

    /// Create an array field defaulting to `[]`
    pub fn list_of(name: impl Into<String>, element: FieldType) -> Self {
        Self::new(name, FieldType::array_of(element)).default_value(Value::Array(Vec::new()))
    }

    /// Marks the field required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Adds a constraint
    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Adds a normalization
    pub fn transform(mut self, transform: Transform) -> Self {
        self.transforms.push(transform);
        self
    }

    /// Sets a literal default
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(DefaultValue::Value(value));
        self
    }

    /// Defaults to the current timestamp
    pub fn default_now(mut self) -> Self {
        self.default = Some(DefaultValue::Now);
        self
    }

    /// Marks the field transient
    pub fn transient(mut self) -> Self {
        self.transient = true;
        self
    }

    /// Sets the description
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Fields that make a record type self-referential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeSpec {
    /// Field holding the node identifier
    pub id_field: String,
    /// Field holding the parent identifier (null for roots)
    pub parent_field: String,
    /// Array field holding nested children in tree input
    pub children_field: String,
}

impl TreeSpec {
    pub fn new(
        id_field: impl Into<String>,
        parent_field: impl Into<String>,
        children_field: impl Into<String>,
    ) -> Self {
        Self {
            id_field: id_field.into(),
            parent_field: parent_field.into(),
            children_field: children_field.into(),
        }
    }
}

/// Complete schema definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Record type name (registry key)
    pub type_name: String,
    /// Schema version
    #[serde(default = "default_version")]
    pub version: String,
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Field definitions in declaration order
    pub fields: Vec<FieldDef>,
    /// Cross-field invariants in declaration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub invariants: Vec<Invariant>,
    /// Computed field definitions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub computed: Vec<ComputedField>,
    /// Present when records of this type form trees
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tree: Option<TreeSpec>,
}

fn default_version() -> String {
    "1".to_string()
}

impl Schema {
    /// Create an empty schema
    pub fn new(type_name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            version: version.into(),
            description: None,
            fields: Vec::new(),
            invariants: Vec::new(),
            computed: Vec::new(),
            tree: None,
        }
    }

    /// Appends a field
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Appends an invariant
    pub fn invariant(mut self, invariant: Invariant) -> Self {
        self.invariants.push(invariant);
        self
    }

    /// Appends a computed field
    pub fn computed(mut self, computed: ComputedField) -> Self {
        self.computed.push(computed);
        self
    }

    /// Declares the tree shape
    pub fn tree(mut self, tree: TreeSpec) -> Self {
        self.tree = Some(tree);
        self
    }

    /// Sets the description
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Looks up a field definition by name
    pub fn field_def(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Validates the schema structure itself (not a record)
    pub fn validate_structure(&self) -> Result<(), String> {
        if self.type_name.trim().is_empty() {
            return Err("Schema type name must not be empty".into());
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name.is_empty() {
                return Err("Field name must not be empty".into());
            }
            if !seen.insert(field.name.as_str()) {
                return Err(format!("Field '{}' declared twice", field.name));
            }
            for constraint in &field.constraints {
                constraint
                    .check_definition(&field.field_type)
                    .map_err(|e| format!("Field '{}': {}", field.name, e))?;
            }
            if !field.transforms.is_empty() && field.field_type != FieldType::String {
                return Err(format!(
                    "Field '{}': transforms need a string field",
                    field.name
                ));
            }
            if field.required && field.default.is_some() {
                return Err(format!(
                    "Field '{}' cannot be both required and defaulted",
                    field.name
                ));
            }
        }

        let mut invariant_ids = HashSet::new();
        for invariant in &self.invariants {
            if !invariant_ids.insert(invariant.id.as_str()) {
                return Err(format!("Invariant '{}' declared twice", invariant.id));
            }
            for operand in invariant.rule.operands() {
                if !seen.contains(operand) {
                    return Err(format!(
                        "Invariant '{}' references undeclared field '{}'",
                        invariant.id, operand
                    ));
                }
            }
            if let InvariantRule::Ordering { before, after, .. } = &invariant.rule {
                self.check_comparable(&invariant.id, before, after)?;
            }
        }

        let mut computed_names = HashSet::new();
        for computed in &self.computed {
            if seen.contains(computed.name.as_str()) {
                return Err(format!(
                    "Computed field '{}' shadows a declared field",
                    computed.name
                ));
            }
            if !computed_names.insert(computed.name.as_str()) {
                return Err(format!("Computed field '{}' declared twice", computed.name));
            }
            for operand in computed.kind.operands() {
                if !seen.contains(operand) {
                    return Err(format!(
                        "Computed field '{}' references undeclared field '{}'",
                        computed.name, operand
                    ));
                }
            }
            if computed.kind.needs_tree() && self.tree.is_none() {
                return Err(format!(
                    "Computed field '{}' needs a tree spec",
                    computed.name
                ));
            }
            if let ComputedKind::Ratio {
                denominator_scale, ..
            } = &computed.kind
            {
                if *denominator_scale == 0.0 {
                    return Err(format!(
                        "Computed field '{}' has a zero denominator scale",
                        computed.name
                    ));
                }
            }
        }

        if let Some(tree) = &self.tree {
            for name in [&tree.id_field, &tree.parent_field, &tree.children_field] {
                if !seen.contains(name.as_str()) {
                    return Err(format!("Tree spec references undeclared field '{}'", name));
                }
            }
            let children = self.field_def(&tree.children_field);
            let expected = FieldType::array_of(FieldType::record(self.type_name.clone()));
            if children.map(|f| &f.field_type) != Some(&expected) {
                return Err(format!(
                    "Tree children field '{}' must be an array of '{}' records",
                    tree.children_field, self.type_name
                ));
            }
            if children.is_some_and(|f| f.required) {
                return Err(format!(
                    "Tree children field '{}' must not be required",
                    tree.children_field
                ));
            }
        }

        Ok(())
    }

    fn check_comparable(&self, invariant: &str, a: &str, b: &str) -> Result<(), String> {
        let ta = self.field_def(a).map(|f| &f.field_type);
        let tb = self.field_def(b).map(|f| &f.field_type);
        let comparable = match (ta, tb) {
            (Some(x), Some(y)) if x.is_numeric() && y.is_numeric() => true,
            (Some(FieldType::Datetime), Some(FieldType::Datetime)) => true,
            (Some(FieldType::String), Some(FieldType::String)) => true,
            _ => false,
        };
        if comparable {
            Ok(())
        } else {
            Err(format!(
                "Invariant '{}' orders fields '{}' and '{}' of incomparable types",
                invariant, a, b
            ))
        }
    }
}
