//! recordkit - A strict, declarative record-validation engine
//!
//! Schemas are data. One engine validates raw JSON against them, checks
//! cross-field invariants, applies normalizations (including a salted
//! one-way hash) and derives computed fields. Self-referential types are
//! resolved into arena-backed trees.

pub mod catalog;
pub mod config;
pub mod observability;
pub mod record;
pub mod schema;
pub mod tree;
pub mod validate;

pub use config::{EngineConfig, OrphanPolicy, UnknownFieldPolicy};
pub use record::{Record, RecordValidator};
pub use schema::{Schema, SchemaRegistry};
pub use tree::{NodeId, RecordTree, TreeResolver};
pub use validate::{ValidationError, ValidationResult};
