//! Cross-field invariant definitions

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Comparison operator used by conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
    Ne,
}

impl CompareOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
        }
    }
}

/// Predicate on one field value against a literal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub op: CompareOp,
    pub value: Value,
}

impl Condition {
    pub fn new(op: CompareOp, value: impl Into<Value>) -> Self {
        Self {
            op,
            value: value.into(),
        }
    }
}

/// The relation an invariant enforces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum InvariantRule {
    /// `before` precedes `after`
    Ordering {
        before: String,
        after: String,
        #[serde(default = "default_strict")]
        strict: bool,
    },
    /// Both fields hold the same pre-normalization value
    Equal { left: String, right: String },
    /// The fields differ (e.g. a parent id and the record's own id)
    NotEqual { left: String, right: String },
    /// When `field` satisfies `condition`, `then_required` must be present
    RequiredIf {
        field: String,
        condition: Condition,
        then_required: String,
    },
}

fn default_strict() -> bool {
    true
}

impl InvariantRule {
    /// Field names the rule reads
    pub fn operands(&self) -> Vec<&str> {
        match self {
            InvariantRule::Ordering { before, after, .. } => vec![before.as_str(), after.as_str()],
            InvariantRule::Equal { left, right } | InvariantRule::NotEqual { left, right } => {
                vec![left.as_str(), right.as_str()]
            }
            InvariantRule::RequiredIf {
                field,
                then_required,
                ..
            } => vec![field.as_str(), then_required.as_str()],
        }
    }

    /// Reason reported when no message is declared
    pub fn default_reason(&self) -> String {
        match self {
            InvariantRule::Ordering {
                before,
                after,
                strict,
            } => {
                if *strict {
                    format!("'{}' must be before '{}'", before, after)
                } else {
                    format!("'{}' must not be after '{}'", before, after)
                }
            }
            InvariantRule::Equal { left, right } => {
                format!("'{}' and '{}' do not match", left, right)
            }
            InvariantRule::NotEqual { left, right } => {
                format!("'{}' cannot be the same as '{}'", left, right)
            }
            InvariantRule::RequiredIf {
                field,
                condition,
                then_required,
            } => format!(
                "'{}' is required when '{}' {} {}",
                then_required,
                field,
                condition.op.symbol(),
                condition.value
            ),
        }
    }
}

/// A named cross-field invariant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invariant {
    /// Identifier reported on violation
    pub id: String,
    #[serde(flatten)]
    pub rule: InvariantRule,
    /// Human-readable reason reported on violation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Invariant {
    pub fn new(id: impl Into<String>, rule: InvariantRule) -> Self {
        Self {
            id: id.into(),
            rule,
            message: None,
        }
    }

    /// `before < after`
    pub fn ordering(id: impl Into<String>, before: impl Into<String>, after: impl Into<String>) -> Self {
        Self::new(
            id,
            InvariantRule::Ordering {
                before: before.into(),
                after: after.into(),
                strict: true,
            },
        )
    }

    /// `left == right`
    pub fn equal(id: impl Into<String>, left: impl Into<String>, right: impl Into<String>) -> Self {
        Self::new(
            id,
            InvariantRule::Equal {
                left: left.into(),
                right: right.into(),
            },
        )
    }

    /// `left != right`
    pub fn not_equal(id: impl Into<String>, left: impl Into<String>, right: impl Into<String>) -> Self {
        Self::new(
            id,
            InvariantRule::NotEqual {
                left: left.into(),
                right: right.into(),
            },
        )
    }

    /// `condition(field) => present(then_required)`
    pub fn required_if(
        id: impl Into<String>,
        field: impl Into<String>,
        condition: Condition,
        then_required: impl Into<String>,
    ) -> Self {
        Self::new(
            id,
            InvariantRule::RequiredIf {
                field: field.into(),
                condition,
                then_required: then_required.into(),
            },
        )
    }

    /// Replaces the reported reason
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Reason reported on violation
    pub fn reason(&self) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| self.rule.default_reason())
    }
}
