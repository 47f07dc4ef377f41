//! Computed-field resolver
//!
//! Derived values are recomputed on every access from the stored field
//! values. Missing or non-numeric inputs yield `null`, never an error.
//! Tree-aware kinds resolve to `null` here; `RecordTree` resolves them.

use serde_json::{Map, Number, Value};

use crate::schema::ComputedKind;

/// Resolves one computed definition against a record's fields.
pub fn resolve(fields: &Map<String, Value>, kind: &ComputedKind) -> Value {
    match kind {
        ComputedKind::Product { fields: names } => {
            fold_numbers(names.iter().map(|n| fields.get(n)), Num::Int(1), Num::mul)
        }
        ComputedKind::Sum { fields: names } => {
            fold_numbers(names.iter().map(|n| fields.get(n)), Num::Int(0), Num::add)
        }
        ComputedKind::Ratio {
            numerator,
            denominator,
            denominator_scale,
            denominator_power,
            precision,
        } => {
            let n = fields.get(numerator).and_then(Value::as_f64);
            let d = fields.get(denominator).and_then(Value::as_f64);
            match (n, d) {
                (Some(n), Some(d)) if n != 0.0 && d != 0.0 => {
                    let divisor = (d * denominator_scale).powi(*denominator_power);
                    let mut ratio = n / divisor;
                    if let Some(places) = precision {
                        let factor = 10f64.powi(*places as i32);
                        ratio = (ratio * factor).round() / factor;
                    }
                    float_value(ratio)
                }
                _ => Value::Null,
            }
        }
        ComputedKind::SumOver { path } => {
            let Some((head, rest)) = path.split_first() else {
                return Value::Null;
            };
            let Some(start) = fields.get(head).filter(|v| !v.is_null()) else {
                return Value::Null;
            };
            let mut total = Num::Int(0);
            let mut stack = vec![(start, rest)];
            while let Some((value, rest)) = stack.pop() {
                match (value, rest.split_first()) {
                    (Value::Array(items), _) => {
                        stack.extend(items.iter().rev().map(|item| (item, rest)));
                    }
                    (Value::Object(map), Some((key, tail))) => {
                        if let Some(next) = map.get(key) {
                            stack.push((next, tail));
                        }
                    }
                    (Value::Number(n), None) => total = total.add(Num::from(n)),
                    _ => {}
                }
            }
            total.into_value()
        }
        ComputedKind::Count { field } => match fields.get(field) {
            Some(Value::Array(items)) => Value::from(items.len()),
            Some(Value::Object(entries)) => Value::from(entries.len()),
            _ => Value::Null,
        },
        ComputedKind::ChildCount
        | ComputedKind::DescendantCount
        | ComputedKind::SubtreeSum { .. } => Value::Null,
    }
}

/// Folds numeric operands; any absent or non-numeric operand gives `null`.
fn fold_numbers<'a>(
    operands: impl Iterator<Item = Option<&'a Value>>,
    init: Num,
    op: fn(Num, Num) -> Num,
) -> Value {
    let mut acc = init;
    for operand in operands {
        match operand {
            Some(Value::Number(n)) => acc = op(acc, Num::from(n)),
            _ => return Value::Null,
        }
    }
    acc.into_value()
}

/// Integer arithmetic while it fits, float otherwise.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn as_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }

    pub(crate) fn add(self, other: Num) -> Num {
        match (self, other) {
            (Num::Int(a), Num::Int(b)) => a
                .checked_add(b)
                .map(Num::Int)
                .unwrap_or(Num::Float(a as f64 + b as f64)),
            _ => Num::Float(self.as_f64() + other.as_f64()),
        }
    }

    pub(crate) fn mul(self, other: Num) -> Num {
        match (self, other) {
            (Num::Int(a), Num::Int(b)) => a
                .checked_mul(b)
                .map(Num::Int)
                .unwrap_or(Num::Float(a as f64 * b as f64)),
            _ => Num::Float(self.as_f64() * other.as_f64()),
        }
    }

    pub(crate) fn into_value(self) -> Value {
        match self {
            Num::Int(i) => Value::from(i),
            Num::Float(f) => float_value(f),
        }
    }
}

impl From<&Number> for Num {
    fn from(n: &Number) -> Self {
        match n.as_i64() {
            Some(i) => Num::Int(i),
            None => Num::Float(n.as_f64().unwrap_or(f64::NAN)),
        }
    }
}

fn float_value(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}
