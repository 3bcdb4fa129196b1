//! Filter predicate evaluation and document ordering
//!
//! Filters are JSON objects mapping field names to either a plain value
//! (equality) or a comparison object whose keys carry the `$` operator
//! sigil, e.g. `{"age": {"$gt": 18}}`. Evaluation walks the parsed
//! structure; operators are only ever recognized as object keys, never
//! inside string values.

use std::cmp::Ordering;

use serde_json::Value;

/// Sort direction for a single sort key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// One (field, direction) entry of an ordered sort specification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub direction: Direction,
}

impl SortKey {
    /// Sort ascending on `field`
    pub fn ascending(field: &str) -> Self {
        Self {
            field: field.to_string(),
            direction: Direction::Ascending,
        }
    }

    /// Sort descending on `field`
    pub fn descending(field: &str) -> Self {
        Self {
            field: field.to_string(),
            direction: Direction::Descending,
        }
    }
}

/// Check whether a document satisfies every condition of a filter
///
/// Non-object filters match nothing; an empty filter matches everything.
pub fn matches(document: &Value, filter: &Value) -> bool {
    let Some(conditions) = filter.as_object() else {
        return false;
    };

    conditions.iter().all(|(field, condition)| {
        let actual = document.get(field).filter(|v| !v.is_null());
        matches_condition(actual, condition)
    })
}

fn matches_condition(actual: Option<&Value>, condition: &Value) -> bool {
    match condition {
        Value::Object(map) if map.keys().any(|key| key.starts_with('$')) => map
            .iter()
            .all(|(operator, operand)| apply_operator(actual, operator, operand)),
        expected => actual.is_some_and(|value| values_equal(value, expected)),
    }
}

fn apply_operator(actual: Option<&Value>, operator: &str, operand: &Value) -> bool {
    let Some(actual) = actual else {
        // Missing fields fail every comparison.
        return false;
    };

    match operator {
        "$gt" => matches!(compare(actual, operand), Some(Ordering::Greater)),
        "$gte" => matches!(
            compare(actual, operand),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        "$lt" => matches!(compare(actual, operand), Some(Ordering::Less)),
        "$lte" => matches!(
            compare(actual, operand),
            Some(Ordering::Less | Ordering::Equal)
        ),
        "$in" => operand.as_array().is_some_and(|candidates| match actual {
            Value::Array(items) => items
                .iter()
                .any(|item| candidates.iter().any(|candidate| item == candidate)),
            value => candidates.iter().any(|candidate| value == candidate),
        }),
        // Unknown operators never match.
        _ => false,
    }
}

/// Equality with array-containment semantics
///
/// A scalar expectation matches an array field when any element equals it,
/// so `{"careers": "Business"}` selects documents whose `careers` list
/// contains `"Business"`.
fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Array(items), expected) if !expected.is_array() => {
            items.iter().any(|item| item == expected)
        }
        (actual, expected) => actual == expected,
    }
}

/// Compare two values for ordering purposes
///
/// Numbers compare numerically, strings lexicographically, booleans as
/// false < true. Mixed or non-comparable types yield `None`.
pub fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Order documents in place by a sequence of sort keys
///
/// Keys apply in sequence; missing and null values sort after present ones
/// regardless of direction. The underlying sort is stable.
pub fn order_documents(documents: &mut [Value], sort: &[SortKey]) {
    documents.sort_by(|a, b| {
        for key in sort {
            let left = a.get(&key.field).filter(|v| !v.is_null());
            let right = b.get(&key.field).filter(|v| !v.is_null());

            let ordering = match (left, right) {
                (Some(x), Some(y)) => {
                    let ordering = compare(x, y).unwrap_or(Ordering::Equal);
                    match key.direction {
                        Direction::Ascending => ordering,
                        Direction::Descending => ordering.reverse(),
                    }
                }
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };

            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}
