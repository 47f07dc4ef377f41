//! Schema registry
//!
//! - Schemas keyed by type name; re-registration overwrites
//! - Schemas compiled on registration (regexes, structure checks)
//! - Schema files: `<dir>/schema_<type>_<version>.json`, one schema per file
//! - Populated at startup, read-only while validating

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use regex::Regex;

use super::constraints::Constraint;
use super::errors::{SchemaError, SchemaResult};
use super::types::{FieldType, Schema};
use crate::observability::{log_event_with_fields, Event};
use crate::validate::{ValidationError, ValidationResult};

/// A registered schema with its regexes compiled.
#[derive(Debug)]
pub struct CompiledSchema {
    schema: Schema,
    patterns: HashMap<String, Regex>,
}

impl CompiledSchema {
    /// Checks structure and compiles every pattern constraint.
    pub fn compile(schema: Schema) -> SchemaResult<Self> {
        schema
            .validate_structure()
            .map_err(|e| SchemaError::malformed(&schema.type_name, e))?;

        let mut patterns = HashMap::new();
        for field in &schema.fields {
            for constraint in &field.constraints {
                if let Constraint::Pattern { regex, .. } = constraint {
                    if patterns.contains_key(regex) {
                        continue;
                    }
                    let compiled = Regex::new(regex).map_err(|e| {
                        SchemaError::malformed(
                            &schema.type_name,
                            format!("Field '{}': invalid pattern: {}", field.name, e),
                        )
                    })?;
                    patterns.insert(regex.clone(), compiled);
                }
            }
        }

        Ok(Self { schema, patterns })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn type_name(&self) -> &str {
        &self.schema.type_name
    }

    pub fn version(&self) -> &str {
        &self.schema.version
    }

    /// Compiled regex for a pattern constraint's source text
    pub fn pattern(&self, source: &str) -> Option<&Regex> {
        self.patterns.get(source)
    }
}

/// In-memory registry of record schemas.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, Arc<CompiledSchema>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a schema, replacing any schema with the same type name.
    ///
    /// A malformed schema is rejected and the registry is left unchanged.
    pub fn register(&mut self, schema: Schema) -> SchemaResult<()> {
        let compiled = CompiledSchema::compile(schema)?;
        let type_name = compiled.type_name().to_string();
        let version = compiled.version().to_string();

        let event = match self.schemas.insert(type_name.clone(), Arc::new(compiled)) {
            Some(_) => Event::SchemaReplaced,
            None => Event::SchemaRegistered,
        };
        log_event_with_fields(event, &[("type", &type_name), ("version", &version)]);

        Ok(())
    }

    /// Looks up a schema by type name.
    pub fn lookup(&self, type_name: &str) -> ValidationResult<&Arc<CompiledSchema>> {
        self.schemas
            .get(type_name)
            .ok_or_else(|| ValidationError::unknown_type(type_name))
    }

    /// Checks if a type is registered.
    pub fn contains(&self, type_name: &str) -> bool {
        self.schemas.contains_key(type_name)
    }

    /// Returns the number of registered schemas.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Registered type names, sorted.
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns record types referenced by nested fields that are not registered.
    pub fn unresolved_references(&self) -> Vec<(String, String)> {
        let mut missing = Vec::new();
        for compiled in self.schemas.values() {
            for field in &compiled.schema().fields {
                let mut ty = &field.field_type;
                loop {
                    match ty {
                        FieldType::Array { element_type } => ty = element_type,
                        FieldType::Map { value_type } => ty = value_type,
                        FieldType::Record { record_type } => {
                            if !self.contains(record_type) {
                                missing.push((
                                    format!("{}.{}", compiled.type_name(), field.name),
                                    record_type.clone(),
                                ));
                            }
                            break;
                        }
                        _ => break,
                    }
                }
            }
        }
        missing.sort();
        missing
    }

    /// Loads every `*.json` schema file in `dir`, in file-name order.
    ///
    /// A missing directory loads nothing. Returns the number of files loaded.
    pub fn load_dir(&mut self, dir: &Path) -> SchemaResult<usize> {
        if !dir.exists() {
            return Ok(0);
        }

        let entries = fs::read_dir(dir).map_err(|source| SchemaError::Io {
            path: dir.display().to_string(),
            source,
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| SchemaError::Io {
                path: dir.display().to_string(),
                source,
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        for path in &paths {
            if let Err(e) = self.load_schema_file(path) {
                log_event_with_fields(
                    Event::SchemaRejected,
                    &[("path", &path.display().to_string()), ("code", e.code())],
                );
                return Err(e);
            }
        }

        log_event_with_fields(
            Event::SchemasLoaded,
            &[
                ("count", &paths.len().to_string()),
                ("dir", &dir.display().to_string()),
            ],
        );

        Ok(paths.len())
    }

    fn load_schema_file(&mut self, path: &Path) -> SchemaResult<()> {
        let content = fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let schema: Schema = serde_json::from_str(&content).map_err(|source| SchemaError::Parse {
            path: path.display().to_string(),
            source,
        })?;

        self.register(schema)
    }

    /// Saves a schema to `dir` as `schema_<type>_<version>.json`.
    pub fn save_schema(dir: &Path, schema: &Schema) -> SchemaResult<PathBuf> {
        schema
            .validate_structure()
            .map_err(|e| SchemaError::malformed(&schema.type_name, e))?;

        let io_err = |path: &Path, source| SchemaError::Io {
            path: path.display().to_string(),
            source,
        };

        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
        }

        let path = dir.join(format!(
            "schema_{}_{}.json",
            schema.type_name, schema.version
        ));
        let content = serde_json::to_string_pretty(schema).map_err(|source| SchemaError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        fs::write(&path, content).map_err(|e| io_err(&path, e))?;

        log_event_with_fields(
            Event::SchemaSaved,
            &[
                ("path", &path.display().to_string()),
                ("type", &schema.type_name),
            ],
        );

        Ok(path)
    }
}

static GLOBAL_REGISTRY: OnceLock<SchemaRegistry> = OnceLock::new();

/// Installs the process-wide registry. It is read-only from then on.
pub fn install_global(registry: SchemaRegistry) -> SchemaResult<&'static SchemaRegistry> {
    let count = registry.len();
    GLOBAL_REGISTRY
        .set(registry)
        .map_err(|_| SchemaError::AlreadyInstalled)?;
    log_event_with_fields(Event::RegistryInstalled, &[("count", &count.to_string())]);
    GLOBAL_REGISTRY.get().ok_or(SchemaError::AlreadyInstalled)
}

/// The process-wide registry, if installed.
pub fn global() -> Option<&'static SchemaRegistry> {
    GLOBAL_REGISTRY.get()
}
