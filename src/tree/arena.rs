//! Arena storage for self-referential records
//!
//! Nodes live in one `Vec` in pre-order; parent and children are `NodeId`
//! indices. No node owns another.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::record::{Num, Record};
use crate::schema::{CompiledSchema, ComputedKind, TreeSpec};

/// Index of a node in its tree's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One validated node. Its children field is not stored in the record.
#[derive(Debug, Clone)]
pub struct TreeNode {
    record: Record,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    depth: usize,
}

impl TreeNode {
    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Roots are at depth 0
    pub fn depth(&self) -> usize {
        self.depth
    }
}

/// A validated forest of records of one self-referential type.
#[derive(Debug, Clone)]
pub struct RecordTree {
    schema: Arc<CompiledSchema>,
    nodes: Vec<TreeNode>,
    roots: Vec<NodeId>,
    by_id: HashMap<String, NodeId>,
}

/// Canonical map key for an id value (`1` and `1.0` differ from `"1"`).
pub(crate) fn id_key(value: &Value) -> String {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => i.to_string(),
            None => n.to_string(),
        },
        other => other.to_string(),
    }
}

/// Id value as shown in errors
pub(crate) fn id_display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl RecordTree {
    pub(crate) fn empty(schema: Arc<CompiledSchema>) -> Self {
        Self {
            schema,
            nodes: Vec::new(),
            roots: Vec::new(),
            by_id: HashMap::new(),
        }
    }

    /// Appends a node; callers push in pre-order.
    pub(crate) fn push(&mut self, record: Record, parent: Option<NodeId>, id: String) -> NodeId {
        let node_id = NodeId(self.nodes.len());
        let depth = match parent {
            Some(p) => self.nodes[p.0].depth + 1,
            None => 0,
        };
        match parent {
            Some(p) => self.nodes[p.0].children.push(node_id),
            None => self.roots.push(node_id),
        }
        self.nodes.push(TreeNode {
            record,
            parent,
            children: Vec::new(),
            depth,
        });
        self.by_id.insert(id, node_id);
        node_id
    }

    pub(crate) fn contains_key(&self, key: &str) -> bool {
        self.by_id.contains_key(key)
    }

    pub fn type_name(&self) -> &str {
        self.schema.type_name()
    }

    pub fn spec(&self) -> Option<&TreeSpec> {
        self.schema.schema().tree.as_ref()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Panics if `id` belongs to another tree.
    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id.0)
    }

    pub fn record(&self, id: NodeId) -> &Record {
        &self.nodes[id.0].record
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Finds a node by the value of its id field.
    pub fn find(&self, id: &Value) -> Option<NodeId> {
        self.by_id.get(&id_key(id)).copied()
    }

    /// All node ids in pre-order.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Deepest node depth; `None` for an empty tree.
    pub fn max_depth(&self) -> Option<usize> {
        self.nodes.iter().map(|n| n.depth).max()
    }

    /// Descendants of `id` in pre-order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Value of a computed field of node `id`.
    ///
    /// Tree-aware kinds see the node's subtree; other kinds resolve against
    /// the node's record alone.
    pub fn computed(&self, id: NodeId, name: &str) -> Option<Value> {
        let def = self
            .schema
            .schema()
            .computed
            .iter()
            .find(|c| c.name == name)?;

        let value = match &def.kind {
            ComputedKind::ChildCount => Value::from(self.children(id).len()),
            ComputedKind::DescendantCount => Value::from(self.descendants(id).len()),
            ComputedKind::SubtreeSum { field } => {
                let mut total = Num::Int(0);
                for node in std::iter::once(id).chain(self.descendants(id)) {
                    if let Some(Value::Number(n)) = self.record(node).get(field) {
                        total = total.add(Num::from(n));
                    }
                }
                total.into_value()
            }
            _ => return self.record(id).computed(name),
        };
        Some(value)
    }

    /// Records in pre-order, each carrying its parent reference.
    pub fn flatten(&self) -> Vec<Record> {
        self.nodes.iter().map(|n| n.record.clone()).collect()
    }

    /// Flat JSON list of records with parent references.
    pub fn to_flat_json(&self) -> Value {
        Value::Array(self.nodes.iter().map(|n| n.record.to_value()).collect())
    }

    /// Nested JSON: a list of roots, children under the children field.
    pub fn to_nested_json(&self) -> Value {
        let Some(spec) = self.spec() else {
            return self.to_flat_json();
        };

        // Children always follow their parent in the arena, so building
        // back-to-front finds every child already rendered.
        let mut built: Vec<Option<Value>> = vec![None; self.nodes.len()];
        for index in (0..self.nodes.len()).rev() {
            let node = &self.nodes[index];
            let children: Vec<Value> = node
                .children
                .iter()
                .filter_map(|c| built[c.0].take())
                .collect();
            let mut fields: Map<String, Value> = node.record.fields().clone();
            fields.insert(spec.children_field.clone(), Value::Array(children));
            built[index] = Some(Value::Object(fields));
        }

        Value::Array(
            self.roots
                .iter()
                .filter_map(|r| built[r.0].take())
                .collect(),
        )
    }
}

/// Same records in the same shape; arena indices are not compared.
impl PartialEq for RecordTree {
    fn eq(&self, other: &Self) -> bool {
        if self.type_name() != other.type_name()
            || self.nodes.len() != other.nodes.len()
            || self.roots.len() != other.roots.len()
        {
            return false;
        }

        let mut stack: Vec<(NodeId, NodeId)> = self
            .roots
            .iter()
            .copied()
            .zip(other.roots.iter().copied())
            .collect();

        while let Some((a, b)) = stack.pop() {
            let (na, nb) = (self.node(a), other.node(b));
            if na.record != nb.record || na.children.len() != nb.children.len() {
                return false;
            }
            stack.extend(na.children.iter().copied().zip(nb.children.iter().copied()));
        }

        true
    }
}
