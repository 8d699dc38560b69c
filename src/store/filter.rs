//! # Filter Documents
//!
//! A filter is a mapping of field name to match condition, combined with
//! AND semantics. A plain value means equality; an object value with a
//! single operator key (`eq`, `neq`, `gt`, `gte`, `lt`, `lte`, `like`,
//! `in`, `is`) is an operator expression. The reserved `_id` field is
//! normalized through identifier coercion before a filter reaches the
//! store.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::id::{DocumentId, ID_FIELD};
use crate::errors::AccessResult;

/// Comparison operators usable in filter conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    In,
    Is,
}

impl FilterOp {
    /// Parse an operator key from a condition object
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "eq" => Some(FilterOp::Eq),
            "neq" => Some(FilterOp::Neq),
            "gt" => Some(FilterOp::Gt),
            "gte" => Some(FilterOp::Gte),
            "lt" => Some(FilterOp::Lt),
            "lte" => Some(FilterOp::Lte),
            "like" => Some(FilterOp::Like),
            "in" => Some(FilterOp::In),
            "is" => Some(FilterOp::Is),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Neq => "neq",
            FilterOp::Gt => "gt",
            FilterOp::Gte => "gte",
            FilterOp::Lt => "lt",
            FilterOp::Lte => "lte",
            FilterOp::Like => "like",
            FilterOp::In => "in",
            FilterOp::Is => "is",
        }
    }
}

/// A filter document: field name -> match value or operator expression
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterDoc(Map<String, Value>);

impl FilterDoc {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition, consuming and returning the filter
    pub fn with(mut self, field: impl Into<String>, value: Value) -> Self {
        self.0.insert(field.into(), value);
        self
    }

    /// An empty filter matches every document
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// The filter as a JSON value, for error payloads
    pub fn as_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    /// Coerce a raw `_id` entry into the native identifier's canonical form.
    ///
    /// A plain `_id` value must coerce or the whole operation aborts with
    /// `InvalidIdentifier`; an operator expression on `_id` is left for the
    /// store to match verbatim. Already-canonical identifiers pass through
    /// unchanged.
    pub fn normalize_id(mut self) -> AccessResult<Self> {
        if let Some(raw) = self.0.get(ID_FIELD) {
            if !raw.is_object() {
                let id = DocumentId::coerce(raw)?;
                self.0.insert(ID_FIELD.to_string(), id.to_value());
            }
        }
        Ok(self)
    }

    /// Whether a document satisfies every condition in this filter
    pub fn matches(&self, doc: &Value) -> bool {
        self.0
            .iter()
            .all(|(field, condition)| matches_condition(doc.get(field.as_str()), condition))
    }
}

impl FromIterator<(String, Value)> for FilterDoc {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Split a condition value into operator and right-hand side
fn parse_condition(condition: &Value) -> (FilterOp, &Value) {
    if let Value::Object(obj) = condition {
        if obj.len() == 1 {
            if let Some((key, rhs)) = obj.iter().next() {
                if let Some(op) = FilterOp::from_key(key) {
                    return (op, rhs);
                }
            }
        }
    }
    (FilterOp::Eq, condition)
}

fn matches_condition(field_value: Option<&Value>, condition: &Value) -> bool {
    let (op, rhs) = parse_condition(condition);

    let field_value = match field_value {
        Some(v) => v,
        // An absent field only satisfies an explicit null check
        None => return op == FilterOp::Is && rhs.is_null(),
    };

    match op {
        FilterOp::Eq => field_value == rhs,
        FilterOp::Neq => field_value != rhs,
        FilterOp::Gt => compare_values(field_value, rhs) > 0,
        FilterOp::Gte => compare_values(field_value, rhs) >= 0,
        FilterOp::Lt => compare_values(field_value, rhs) < 0,
        FilterOp::Lte => compare_values(field_value, rhs) <= 0,
        FilterOp::Like => match (field_value.as_str(), rhs.as_str()) {
            (Some(value), Some(pattern)) => like_match(value, pattern),
            _ => false,
        },
        FilterOp::In => match rhs.as_array() {
            Some(values) => values.contains(field_value),
            None => false,
        },
        FilterOp::Is => {
            if rhs.is_null() {
                field_value.is_null()
            } else {
                !field_value.is_null()
            }
        }
    }
}

/// Order two JSON values; non-comparable pairs compare equal
pub(crate) fn compare_values(a: &Value, b: &Value) -> i32 {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => {
            let a = a.as_f64().unwrap_or(0.0);
            let b = b.as_f64().unwrap_or(0.0);
            if a < b {
                -1
            } else if a > b {
                1
            } else {
                0
            }
        }
        (Value::String(a), Value::String(b)) => match a.cmp(b) {
            std::cmp::Ordering::Less => -1,
            std::cmp::Ordering::Equal => 0,
            std::cmp::Ordering::Greater => 1,
        },
        _ => 0,
    }
}

/// SQL-style LIKE matching: `%` = any sequence, `_` = single character
fn like_match(value: &str, pattern: &str) -> bool {
    fn inner(value: &[char], pattern: &[char]) -> bool {
        match pattern.split_first() {
            None => value.is_empty(),
            Some(('%', rest)) => {
                if rest.is_empty() {
                    return true;
                }
                (0..=value.len()).any(|skip| inner(&value[skip..], rest))
            }
            Some(('_', rest)) => match value.split_first() {
                Some((_, value_rest)) => inner(value_rest, rest),
                None => false,
            },
            Some((p, rest)) => match value.split_first() {
                Some((v, value_rest)) => v == p && inner(value_rest, rest),
                None => false,
            },
        }
    }

    let value: Vec<char> = value.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();
    inner(&value, &pattern)
}
