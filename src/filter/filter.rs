use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

use super::types::{Condition, FilterOp};
use crate::types::{lookup_path, parse_instant, Document};

/// Conjunction of conditions; an empty filter matches everything
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self { conditions: vec![Condition::new(field, FilterOp::Eq, value)] }
    }

    pub fn push(&mut self, condition: Condition) -> &mut Self {
        self.conditions.push(condition);
        self
    }

    pub fn and(mut self, field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::new(field, op, value));
        self
    }

    /// Add every condition of `other`
    pub fn merge(mut self, other: &Filter) -> Self {
        self.conditions.extend(other.conditions.iter().cloned());
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Evaluate against a document, the way the in-memory store does
    pub fn matches(&self, doc: &Document) -> bool {
        self.conditions.iter().all(|c| condition_matches(c, doc))
    }
}

fn condition_matches(condition: &Condition, doc: &Document) -> bool {
    let Some(stored) = lookup_path(doc, &condition.field) else {
        return condition.value.is_null() && condition.op == FilterOp::Eq;
    };
    match stored {
        // Arrays match when any element does
        Value::Array(items) => items.iter().any(|item| op_holds(condition.op, compare(item, &condition.value))),
        _ => op_holds(condition.op, compare(stored, &condition.value)),
    }
}

fn op_holds(op: FilterOp, ordering: Option<Ordering>) -> bool {
    let Some(ordering) = ordering else { return false };
    match op {
        FilterOp::Eq => ordering == Ordering::Equal,
        FilterOp::Gt => ordering == Ordering::Greater,
        FilterOp::Gte => ordering != Ordering::Less,
        FilterOp::Lt => ordering == Ordering::Less,
        FilterOp::Lte => ordering != Ordering::Greater,
    }
}

/// Order a stored value against a filter value; numeric strings compare as
/// numbers against numbers, timestamps compare chronologically
pub fn compare(stored: &Value, wanted: &Value) -> Option<Ordering> {
    match (stored, wanted) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::Number(a), Value::String(b)) => a.as_f64()?.partial_cmp(&b.trim().parse::<f64>().ok()?),
        (Value::String(a), Value::Number(b)) => a.trim().parse::<f64>().ok()?.partial_cmp(&b.as_f64()?),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::String(b)) => Some(a.cmp(&b.parse::<bool>().ok()?)),
        (Value::String(a), Value::String(b)) => match (parse_instant(a), parse_instant(b)) {
            (Some(x), Some(y)) => Some(x.cmp(&y)),
            _ => Some(a.as_str().cmp(b.as_str())),
        },
        _ => None,
    }
}

/// Total order used for sorting documents; missing values sort first
pub fn sort_order(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => compare(x, y).unwrap_or_else(|| type_rank(x).cmp(&type_rank(y))),
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Number(_) => 1,
        Value::String(_) => 2,
        Value::Object(_) => 3,
        Value::Array(_) => 4,
        Value::Bool(_) => 5,
    }
}
