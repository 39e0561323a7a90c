//! Generic filtering and sorting over record collections

use crate::core::Data;
use crate::core::field::FieldValue;
use crate::core::query::SortSpec;
use serde_json::Value;
use std::cmp::Ordering;

/// Check a row against a JSON filter object.
///
/// Keys are field names for exact matches, or a field name followed by one
/// of `>`, `<`, `>=`, `<=` for comparisons. Unknown fields never match.
pub fn matches_filter<T: Data>(row: &T, filter: &Value) -> bool {
    let Some(obj) = filter.as_object() else {
        return true;
    };

    obj.iter().all(|(key, expected)| {
        let (field, op) = split_operator(key);
        let Some(actual) = row.field_value(field) else {
            return false;
        };

        match op {
            None => actual.matches_json(expected),
            Some(op) => {
                let expected = FieldValue::from_json(expected);
                if actual.is_null() {
                    return false;
                }
                let ord = actual.compare(&expected);
                match op {
                    ">" => ord == Ordering::Greater,
                    "<" => ord == Ordering::Less,
                    ">=" => ord != Ordering::Less,
                    "<=" => ord != Ordering::Greater,
                    _ => false,
                }
            }
        }
    })
}

fn split_operator(key: &str) -> (&str, Option<&str>) {
    for op in [">=", "<=", ">", "<"] {
        if let Some(field) = key.strip_suffix(op) {
            return (field, Some(op));
        }
    }
    (key, None)
}

/// Stable sort of rows by one field; missing fields sort like nulls
pub fn sort_rows<T: Data>(mut rows: Vec<T>, sort: &SortSpec) -> Vec<T> {
    rows.sort_by(|a, b| {
        let left = a.field_value(&sort.field).unwrap_or(FieldValue::Null);
        let right = b.field_value(&sort.field).unwrap_or(FieldValue::Null);
        let ord = left.compare(&right);
        if sort.descending { ord.reverse() } else { ord }
    });
    rows
}
