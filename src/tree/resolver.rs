//! Tree resolver
//!
//! Builds a `RecordTree` from nested input (children embedded under the
//! children field) or from a flat list of records with parent references.
//!
//! ## Guarantees
//! - Every node is validated with the type's schema
//! - Input is walked with an explicit stack; depth is bounded by config
//! - A node whose id equals an ancestor's id is a cycle
//! - Flat input nodes unreachable from any root form a cycle
//! - Node ids are unique within one tree
//! - A nested root may only name a parent that is absent from the input

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::arena::{id_display, id_key, NodeId, RecordTree};
use crate::config::OrphanPolicy;
use crate::observability::{Event, Logger};
use crate::record::{Record, RecordValidator};
use crate::schema::{CompiledSchema, TreeSpec};
use crate::validate::{
    display_path, index_path, json_type_name, make_path, values_equal, ValidationError,
    ValidationResult,
};

struct Frame<'v> {
    raw: &'v Value,
    parent: Option<NodeId>,
    depth: usize,
    path: String,
}

/// Resolves self-referential record types into arena trees.
pub struct TreeResolver<'a> {
    validator: RecordValidator<'a>,
}

impl<'a> TreeResolver<'a> {
    pub fn new(validator: RecordValidator<'a>) -> Self {
        Self { validator }
    }

    pub fn validator(&self) -> &RecordValidator<'a> {
        &self.validator
    }

    /// Validates nested input: one root object or an array of roots.
    pub fn resolve(&self, type_name: &str, raw: &Value) -> ValidationResult<RecordTree> {
        let (compiled, spec) = self.tree_schema(type_name)?;
        let config = self.validator.config();

        let mut stack: Vec<Frame<'_>> = match raw {
            Value::Object(_) => vec![Frame {
                raw,
                parent: None,
                depth: 0,
                path: String::new(),
            }],
            Value::Array(roots) => roots
                .iter()
                .enumerate()
                .rev()
                .map(|(i, root)| Frame {
                    raw: root,
                    parent: None,
                    depth: 0,
                    path: index_path("", i),
                })
                .collect(),
            other => {
                return Err(ValidationError::type_mismatch(
                    "$root",
                    "object or array",
                    json_type_name(other),
                ))
            }
        };

        let mut tree = RecordTree::empty(Arc::clone(&compiled));

        while let Some(frame) = stack.pop() {
            if frame.depth > config.max_depth {
                return Err(ValidationError::DepthExceeded {
                    path: display_path(&frame.path),
                    max_depth: config.max_depth,
                });
            }

            let Value::Object(input) = frame.raw else {
                return Err(ValidationError::type_mismatch(
                    display_path(&frame.path),
                    "object",
                    json_type_name(frame.raw),
                ));
            };

            let children_path = make_path(&frame.path, &spec.children_field);
            let children: &[Value] = match input.get(&spec.children_field) {
                None | Some(Value::Null) => &[],
                Some(Value::Array(items)) => items,
                Some(other) => {
                    return Err(ValidationError::type_mismatch(
                        children_path,
                        "array",
                        json_type_name(other),
                    ))
                }
            };

            let mut node_input: Map<String, Value> = input
                .iter()
                .filter(|(k, _)| **k != spec.children_field)
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();

            if let Some(parent) = frame.parent {
                let parent_id = tree
                    .record(parent)
                    .get(&spec.id_field)
                    .cloned()
                    .unwrap_or(Value::Null);
                match node_input.get(&spec.parent_field).filter(|v| !v.is_null()) {
                    Some(declared) if !values_equal(declared, &parent_id) => {
                        return Err(ValidationError::invariant(
                            "parent_reference",
                            format!(
                                "'{}' at {} is {} but the enclosing node is {}",
                                spec.parent_field,
                                display_path(&frame.path),
                                declared,
                                parent_id
                            ),
                        ));
                    }
                    Some(_) => {}
                    None => {
                        node_input.insert(spec.parent_field.clone(), parent_id);
                    }
                }
            }

            let record = self
                .validator
                .validate_at(
                    compiled.type_name(),
                    &Value::Object(node_input),
                    &frame.path,
                    frame.depth,
                )?
                .without_field(&spec.children_field);

            let (key, shown) = node_id(&record, &spec, &frame.path)?;
            if parent_key(&record, &spec).as_deref() == Some(key.as_str()) {
                return Err(ValidationError::CyclicReference { id: shown });
            }

            let mut ancestor = frame.parent;
            while let Some(a) = ancestor {
                if tree.record(a).get(&spec.id_field).map(id_key).as_deref() == Some(key.as_str()) {
                    return Err(ValidationError::CyclicReference { id: shown });
                }
                ancestor = tree.parent(a);
            }

            if tree.contains_key(&key) {
                return Err(duplicate_id(&shown));
            }

            let node = tree.push(record, frame.parent, key);

            // Reversed so the first child is processed next (pre-order).
            for (i, child) in children.iter().enumerate().rev() {
                stack.push(Frame {
                    raw: child,
                    parent: Some(node),
                    depth: frame.depth + 1,
                    path: index_path(&children_path, i),
                });
            }
        }

        self.check_root_parents(&tree, &spec)?;

        log_resolved(&tree);
        Ok(tree)
    }

    /// A nested root that declares a parent must not name a node of the
    /// same input: nesting decides the shape. A parent absent from the
    /// input is an orphan and follows the orphan policy.
    fn check_root_parents(&self, tree: &RecordTree, spec: &TreeSpec) -> ValidationResult<()> {
        for &root in tree.roots() {
            let record = tree.record(root);
            let Some(declared) = record.get(&spec.parent_field).filter(|v| !v.is_null()) else {
                continue;
            };
            let shown = record
                .get(&spec.id_field)
                .map(id_display)
                .unwrap_or_default();

            if tree.find(declared).is_some() {
                return Err(ValidationError::invariant(
                    "parent_reference",
                    format!(
                        "root {} declares parent {} but is not nested under it",
                        shown,
                        id_display(declared)
                    ),
                ));
            }
            if self.validator.config().orphan_policy == OrphanPolicy::Reject {
                return Err(ValidationError::DanglingReference {
                    id: shown,
                    parent: id_display(declared),
                });
            }
        }
        Ok(())
    }

    /// Validates a flat list of raw records and links them by parent id.
    pub fn from_flat(&self, type_name: &str, nodes: &[Value]) -> ValidationResult<RecordTree> {
        let (compiled, spec) = self.tree_schema(type_name)?;
        let records = nodes
            .iter()
            .enumerate()
            .map(|(i, raw)| {
                self.validator
                    .validate_at(compiled.type_name(), raw, &index_path("", i), 0)
            })
            .collect::<ValidationResult<Vec<_>>>()?;

        let tree = self.link(compiled, &spec, records)?;
        log_resolved(&tree);
        Ok(tree)
    }

    /// Links already-validated records of `type_name` by parent id.
    ///
    /// Records are not re-validated, so one-way transformed values survive.
    pub fn from_records(
        &self,
        type_name: &str,
        records: Vec<Record>,
    ) -> ValidationResult<RecordTree> {
        let (compiled, spec) = self.tree_schema(type_name)?;
        if let Some((i, other)) = records
            .iter()
            .enumerate()
            .find(|(_, r)| r.type_name() != compiled.type_name())
        {
            return Err(ValidationError::type_mismatch(
                index_path("", i),
                compiled.type_name(),
                other.type_name(),
            ));
        }
        self.link(compiled, &spec, records)
    }

    fn link(
        &self,
        compiled: Arc<CompiledSchema>,
        spec: &TreeSpec,
        records: Vec<Record>,
    ) -> ValidationResult<RecordTree> {
        let config = self.validator.config();

        // Shape comes from parent ids alone.
        let records: Vec<Record> = records
            .into_iter()
            .map(|r| r.without_field(&spec.children_field))
            .collect();

        let mut index: HashMap<String, usize> = HashMap::with_capacity(records.len());
        let mut keys: Vec<(String, String)> = Vec::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            let (key, shown) = node_id(record, spec, &index_path("", i))?;
            if index.insert(key.clone(), i).is_some() {
                return Err(duplicate_id(&shown));
            }
            keys.push((key, shown));
        }

        let mut children: Vec<Vec<usize>> = vec![Vec::new(); records.len()];
        let mut roots = Vec::new();
        for (i, record) in records.iter().enumerate() {
            let Some(declared) = record.get(&spec.parent_field).filter(|v| !v.is_null()) else {
                roots.push(i);
                continue;
            };
            let parent = id_key(declared);
            if parent == keys[i].0 {
                return Err(ValidationError::CyclicReference {
                    id: keys[i].1.clone(),
                });
            }
            match index.get(&parent) {
                Some(&p) => children[p].push(i),
                None => match config.orphan_policy {
                    OrphanPolicy::Reject => {
                        return Err(ValidationError::DanglingReference {
                            id: keys[i].1.clone(),
                            parent: id_display(declared),
                        })
                    }
                    OrphanPolicy::TreatAsRoot => roots.push(i),
                },
            }
        }

        let mut slots: Vec<Option<Record>> = records.into_iter().map(Some).collect();
        let mut tree = RecordTree::empty(compiled);
        let mut stack: Vec<(usize, Option<NodeId>, usize)> =
            roots.iter().rev().map(|&r| (r, None, 0)).collect();

        while let Some((i, parent, depth)) = stack.pop() {
            if depth > config.max_depth {
                return Err(ValidationError::DepthExceeded {
                    path: index_path("", i),
                    max_depth: config.max_depth,
                });
            }
            let Some(record) = slots[i].take() else {
                continue;
            };
            let node = tree.push(record, parent, std::mem::take(&mut keys[i].0));
            stack.extend(children[i].iter().rev().map(|&c| (c, Some(node), depth + 1)));
        }

        // Every node has one parent, so whatever no root reaches sits on a cycle.
        if let Some(i) = slots.iter().position(Option::is_some) {
            return Err(ValidationError::CyclicReference {
                id: keys[i].1.clone(),
            });
        }

        Ok(tree)
    }

    fn tree_schema(&self, type_name: &str) -> ValidationResult<(Arc<CompiledSchema>, TreeSpec)> {
        let compiled = Arc::clone(self.validator.registry().lookup(type_name)?);
        let spec = compiled
            .schema()
            .tree
            .clone()
            .ok_or_else(|| ValidationError::NotRecursive {
                type_name: type_name.to_string(),
            })?;
        Ok((compiled, spec))
    }
}

/// Map key and display form of a record's id.
fn node_id(record: &Record, spec: &TreeSpec, path: &str) -> ValidationResult<(String, String)> {
    let id = record
        .get(&spec.id_field)
        .filter(|v| !v.is_null())
        .ok_or_else(|| ValidationError::missing(make_path(path, &spec.id_field)))?;
    Ok((id_key(id), id_display(id)))
}

fn parent_key(record: &Record, spec: &TreeSpec) -> Option<String> {
    record
        .get(&spec.parent_field)
        .filter(|v| !v.is_null())
        .map(id_key)
}

fn duplicate_id(shown: &str) -> ValidationError {
    ValidationError::invariant("unique_node_id", format!("node id {} appears twice", shown))
}

fn log_resolved(tree: &RecordTree) {
    Logger::trace(
        Event::TreeResolved.as_str(),
        &[
            ("type", tree.type_name()),
            ("nodes", &tree.len().to_string()),
            ("roots", &tree.roots().len().to_string()),
        ],
    );
}
