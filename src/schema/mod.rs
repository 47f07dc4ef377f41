//! Schema subsystem for recordkit
//!
//! A schema is data: field definitions with constraints and normalizations,
//! cross-field invariants, computed field definitions and an optional tree
//! shape. One generic engine interprets every schema.
//!
//! # Design Principles
//!
//! - Schemas are immutable once registered
//! - Registration compiles and checks the schema; malformed schemas never
//!   reach the registry
//! - The registry is read-only while records are validated

mod computed;
mod constraints;
mod errors;
mod invariants;
mod registry;
mod types;

pub use computed::{ComputedField, ComputedKind};
pub use constraints::{Constraint, Transform};
pub use errors::{SchemaError, SchemaResult};
pub use invariants::{CompareOp, Condition, Invariant, InvariantRule};
pub use registry::{global, install_global, CompiledSchema, SchemaRegistry};
pub use types::{DefaultValue, FieldDef, FieldType, Schema, TreeSpec};
