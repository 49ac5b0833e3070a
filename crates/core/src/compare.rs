//! Structural attribute comparison
//!
//! Only keys present on the expected side are checked, nested objects are
//! compared recursively and arrays are compared as multisets: element order
//! is ignored but duplicates are counted. Numbers compare by numeric value,
//! so `5` and `5.0` are equal; a number never equals a string.

use crate::types::Attributes;
use serde_json::{Number, Value};

/// Check that every expected attribute is present in `actual` with a matching value
///
/// A key missing from `actual` compares as `null`.
pub fn attributes_match(expected: &Attributes, actual: &Attributes) -> bool {
    expected.iter().all(|(key, want)| {
        let got = actual.get(key).unwrap_or(&Value::Null);
        values_match(want, got)
    })
}

/// Compare a single expected value against an actual one
pub fn values_match(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Object(want), Value::Object(got)) => attributes_match(want, got),
        (Value::Array(want), Value::Array(got)) => multiset_eq(want, got),
        _ => json_eq(expected, actual),
    }
}

/// Full structural equality with numeric comparison of numbers
///
/// Unlike [`values_match`], objects must have the same key set and arrays
/// the same element order.
pub fn json_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => numbers_eq(a, b),
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| json_eq(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, x)| b.get(key).map_or(false, |y| json_eq(x, y)))
        }
        _ => left == right,
    }
}

fn numbers_eq(a: &Number, b: &Number) -> bool {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x == y;
    }
    if a.is_f64() || b.is_f64() {
        return a.as_f64() == b.as_f64();
    }
    // one negative integer, one beyond i64::MAX
    false
}

/// Order-independent, duplicate-aware sequence equality
///
/// Each element of `left` consumes one equal element from a working copy of
/// `right`. The sides match when every element found a partner and nothing
/// is left over.
pub fn multiset_eq(left: &[Value], right: &[Value]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    let mut remaining: Vec<&Value> = right.iter().collect();
    for element in left {
        match remaining.iter().position(|candidate| json_eq(candidate, element)) {
            Some(pos) => {
                remaining.swap_remove(pos);
            }
            None => return false,
        }
    }
    remaining.is_empty()
}
