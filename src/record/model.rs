//! Validated record

use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use super::computed;
use crate::schema::CompiledSchema;

/// An immutable record that passed validation.
///
/// Fields are stored in declaration order with normalizations applied.
/// Computed fields are not stored; they are derived on access.
#[derive(Clone)]
pub struct Record {
    schema: Arc<CompiledSchema>,
    fields: Map<String, Value>,
}

impl Record {
    pub(crate) fn new(schema: Arc<CompiledSchema>, fields: Map<String, Value>) -> Self {
        Self { schema, fields }
    }

    pub fn type_name(&self) -> &str {
        self.schema.type_name()
    }

    pub fn version(&self) -> &str {
        self.schema.version()
    }

    pub fn schema(&self) -> &Arc<CompiledSchema> {
        &self.schema
    }

    /// Stored value of a field; `None` if the field is absent.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Value of a computed field.
    ///
    /// `None` if the schema declares no such computed field; `Some(Value::Null)`
    /// if an input is missing.
    pub fn computed(&self, name: &str) -> Option<Value> {
        self.schema
            .schema()
            .computed
            .iter()
            .find(|c| c.name == name)
            .map(|c| computed::resolve(&self.fields, &c.kind))
    }

    /// Every computed field, in declaration order.
    pub fn computed_values(&self) -> Map<String, Value> {
        self.schema
            .schema()
            .computed
            .iter()
            .map(|c| (c.name.clone(), computed::resolve(&self.fields, &c.kind)))
            .collect()
    }

    /// Stored fields as a JSON object. Restores losslessly.
    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }

    /// Stored fields followed by computed fields.
    pub fn dump(&self) -> Value {
        let mut out = self.fields.clone();
        out.extend(self.computed_values());
        Value::Object(out)
    }

    pub(crate) fn without_field(mut self, name: &str) -> Self {
        self.fields.shift_remove(name);
        self
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.type_name() == other.type_name()
            && self.version() == other.version()
            && self.fields == other.fields
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("type_name", &self.type_name())
            .field("version", &self.version())
            .field("fields", &self.fields)
            .finish()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}
