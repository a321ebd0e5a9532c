//! Query evaluation over in-memory documents.

use std::cmp::Ordering;

use serde_json::Value;

use crate::{Direction, DocumentData, DocumentPath, Filter, FilterOp, OrderBy};

/// Resolves a dotted field path inside a document.
pub(crate) fn field<'a>(data: &'a DocumentData, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = data.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Rank of a value type in the cross-type ordering.
fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order over JSON values: values of different types order by type.
pub(crate) fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => {
            let a = a.as_f64().unwrap_or_default();
            let b = b.as_f64().unwrap_or_default();
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Array(a), Value::Array(b)) => {
            for (left, right) in a.iter().zip(b) {
                let ordering = compare_values(left, right);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            a.len().cmp(&b.len())
        }
        (Value::Object(a), Value::Object(b)) => {
            for ((left_key, left), (right_key, right)) in a.iter().zip(b) {
                let ordering = left_key
                    .cmp(right_key)
                    .then_with(|| compare_values(left, right));
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            a.len().cmp(&b.len())
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    compare_values(a, b) == Ordering::Equal
}

/// Returns whether a document satisfies a filter.
///
/// Documents missing the filtered field never match.
pub(crate) fn matches(data: &DocumentData, filter: &Filter) -> bool {
    let Some(actual) = field(data, &filter.field) else {
        return false;
    };
    let expected = &filter.value;
    let same_type = type_rank(actual) == type_rank(expected);

    match filter.op {
        FilterOp::Equal => values_equal(actual, expected),
        FilterOp::NotEqual => !values_equal(actual, expected),
        FilterOp::LessThan => same_type && compare_values(actual, expected).is_lt(),
        FilterOp::LessThanOrEqual => same_type && compare_values(actual, expected).is_le(),
        FilterOp::GreaterThan => same_type && compare_values(actual, expected).is_gt(),
        FilterOp::GreaterThanOrEqual => same_type && compare_values(actual, expected).is_ge(),
        FilterOp::In => expected
            .as_array()
            .is_some_and(|candidates| candidates.iter().any(|c| values_equal(actual, c))),
        FilterOp::NotIn => expected
            .as_array()
            .is_some_and(|candidates| !candidates.iter().any(|c| values_equal(actual, c))),
        FilterOp::ArrayContains => actual
            .as_array()
            .is_some_and(|items| items.iter().any(|item| values_equal(item, expected))),
        FilterOp::ArrayContainsAny => match (actual.as_array(), expected.as_array()) {
            (Some(items), Some(candidates)) => items
                .iter()
                .any(|item| candidates.iter().any(|c| values_equal(item, c))),
            _ => false,
        },
    }
}

/// Extracts the ordering values of a document.
///
/// Returns `None` when the document lacks one of the ordered fields, which
/// excludes it from the ordered result.
pub(crate) fn order_values(data: &DocumentData, orderings: &[OrderBy]) -> Option<Vec<Value>> {
    orderings
        .iter()
        .map(|ordering| field(data, &ordering.field).cloned())
        .collect()
}

/// Compares two query positions: ordering values first, then document path.
pub(crate) fn compare_positions(
    (a_values, a_path): (&[Value], &DocumentPath),
    (b_values, b_path): (&[Value], &DocumentPath),
    orderings: &[OrderBy],
) -> Ordering {
    for ((a, b), ordering) in a_values.iter().zip(b_values).zip(orderings) {
        let mut result = compare_values(a, b);
        if ordering.direction == Direction::Descending {
            result = result.reverse();
        }
        if result != Ordering::Equal {
            return result;
        }
    }
    a_path.to_string().cmp(&b_path.to_string())
}

/// Keeps only the selected field paths of a document.
pub(crate) fn project(data: &DocumentData, fields: &[String]) -> DocumentData {
    let mut projected = DocumentData::new();
    for path in fields {
        if let Some(value) = field(data, path) {
            set_field(&mut projected, path, value.clone());
        }
    }
    projected
}

/// Sets a value at a dotted field path, creating intermediate objects.
pub(crate) fn set_field(data: &mut DocumentData, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            data.insert(path.to_owned(), value);
        }
        Some((head, rest)) => {
            let entry = data
                .entry(head.to_owned())
                .or_insert_with(|| Value::Object(DocumentData::new()));
            if !entry.is_object() {
                *entry = Value::Object(DocumentData::new());
            }
            if let Value::Object(nested) = entry {
                set_field(nested, rest, value);
            }
        }
    }
}

/// Deep-merges `source` into `target`.
pub(crate) fn merge(target: &mut DocumentData, source: DocumentData) {
    for (key, value) in source {
        match (target.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => merge(existing, incoming),
            (_, value) => {
                target.insert(key, value);
            }
        }
    }
}
