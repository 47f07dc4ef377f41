//! Computed field definitions
//!
//! Resolution lives in `record::computed` (plain records) and `tree`
//! (tree-aware kinds).

use serde::{Deserialize, Serialize};

/// How a computed value is derived
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComputedKind {
    /// Product of numeric fields
    Product { fields: Vec<String> },
    /// Sum of numeric fields
    Sum { fields: Vec<String> },
    /// `numerator / (denominator * scale) ^ power`, optionally rounded
    Ratio {
        numerator: String,
        denominator: String,
        #[serde(default = "default_scale")]
        denominator_scale: f64,
        #[serde(default = "default_power")]
        denominator_power: i32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        precision: Option<u32>,
    },
    /// Sum of a leaf field reached through nested records and arrays
    SumOver { path: Vec<String> },
    /// Number of items in an array or map field
    Count { field: String },
    /// Number of direct children in a tree
    ChildCount,
    /// Number of descendants in a tree
    DescendantCount,
    /// Sum of a numeric field over a node and all its descendants
    SubtreeSum { field: String },
}

fn default_scale() -> f64 {
    1.0
}
fn default_power() -> i32 {
    1
}

impl ComputedKind {
    /// Top-level field names read by this kind
    pub fn operands(&self) -> Vec<&str> {
        match self {
            ComputedKind::Product { fields } | ComputedKind::Sum { fields } => {
                fields.iter().map(String::as_str).collect()
            }
            ComputedKind::Ratio {
                numerator,
                denominator,
                ..
            } => vec![numerator.as_str(), denominator.as_str()],
            ComputedKind::SumOver { path } => path.first().map(String::as_str).into_iter().collect(),
            ComputedKind::Count { field } | ComputedKind::SubtreeSum { field } => vec![field.as_str()],
            ComputedKind::ChildCount | ComputedKind::DescendantCount => Vec::new(),
        }
    }

    /// Whether the value depends on tree structure
    pub fn needs_tree(&self) -> bool {
        matches!(
            self,
            ComputedKind::ChildCount | ComputedKind::DescendantCount | ComputedKind::SubtreeSum { .. }
        )
    }
}

/// A named computed field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputedField {
    pub name: String,
    #[serde(flatten)]
    pub kind: ComputedKind,
}

impl ComputedField {
    pub fn new(name: impl Into<String>, kind: ComputedKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// `a * b * ...`
    pub fn product<I, S>(name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            name,
            ComputedKind::Product {
                fields: fields.into_iter().map(Into::into).collect(),
            },
        )
    }

    /// Sum of `path` leaves, e.g. `["modules", "lessons", "duration"]`
    pub fn sum_over<I, S>(name: impl Into<String>, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            name,
            ComputedKind::SumOver {
                path: path.into_iter().map(Into::into).collect(),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ratio_defaults() {
        let field: ComputedField = serde_json::from_value(json!({
            "name": "bmi",
            "kind": "ratio",
            "numerator": "weight",
            "denominator": "height"
        }))
        .unwrap();
        match field.kind {
            ComputedKind::Ratio {
                denominator_scale,
                denominator_power,
                precision,
                ..
            } => {
                assert_eq!(denominator_scale, 1.0);
                assert_eq!(denominator_power, 1);
                assert_eq!(precision, None);
            }
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_operands() {
        let total = ComputedField::sum_over("total_duration", ["modules", "lessons", "duration"]);
        assert_eq!(total.kind.operands(), vec!["modules"]);
        assert!(ComputedKind::DescendantCount.needs_tree());
        assert!(!total.kind.needs_tree());
    }
}
