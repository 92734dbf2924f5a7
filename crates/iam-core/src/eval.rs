//! Comparison primitives behind leaf operators
//!
//! Every primitive takes the attribute value first and the policy value
//! second, and is total: operands of incompatible types or shapes yield
//! `false` instead of an error. Equality and membership are defined for any
//! pair of values, so their negations are exact complements. Ordering and
//! string-affix primitives only apply to compatible operands; for anything
//! else both the positive and the negated primitive return `false`.

use crate::value::Value;
use std::cmp::Ordering;

/// Signature shared by all comparison primitives
pub type OpFn = fn(&Value, &Value) -> bool;

/// Order two values if they are both numbers or both strings
fn compare_ordered(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Some(x.cmp(y)),
        (Value::String(x), Value::String(y)) => Some(x.as_str().cmp(y.as_str())),
        _ => {
            let x = a.as_f64()?;
            let y = b.as_f64()?;
            x.partial_cmp(&y)
        }
    }
}

fn string_pair<'a>(a: &'a Value, b: &'a Value) -> Option<(&'a str, &'a str)> {
    Some((a.as_str()?, b.as_str()?))
}

pub fn equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            compare_ordered(a, b) == Some(Ordering::Equal)
        }
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| equal(x, y))
        }
        _ => a == b,
    }
}

pub fn not_equal(a: &Value, b: &Value) -> bool {
    !equal(a, b)
}

pub fn less(a: &Value, b: &Value) -> bool {
    compare_ordered(a, b) == Some(Ordering::Less)
}

pub fn less_or_equal(a: &Value, b: &Value) -> bool {
    matches!(compare_ordered(a, b), Some(Ordering::Less | Ordering::Equal))
}

pub fn greater(a: &Value, b: &Value) -> bool {
    compare_ordered(a, b) == Some(Ordering::Greater)
}

pub fn greater_or_equal(a: &Value, b: &Value) -> bool {
    matches!(compare_ordered(a, b), Some(Ordering::Greater | Ordering::Equal))
}

pub fn starts_with(a: &Value, b: &Value) -> bool {
    string_pair(a, b).map_or(false, |(s, prefix)| s.starts_with(prefix))
}

pub fn not_starts_with(a: &Value, b: &Value) -> bool {
    string_pair(a, b).map_or(false, |(s, prefix)| !s.starts_with(prefix))
}

pub fn ends_with(a: &Value, b: &Value) -> bool {
    string_pair(a, b).map_or(false, |(s, suffix)| s.ends_with(suffix))
}

pub fn not_ends_with(a: &Value, b: &Value) -> bool {
    string_pair(a, b).map_or(false, |(s, suffix)| !s.ends_with(suffix))
}

/// Attribute value is one of the elements of the policy array
pub fn in_list(a: &Value, b: &Value) -> bool {
    b.as_array().map_or(false, |items| items.iter().any(|item| equal(a, item)))
}

pub fn not_in_list(a: &Value, b: &Value) -> bool {
    b.as_array().map_or(false, |items| !items.iter().any(|item| equal(a, item)))
}

/// Policy value is one of the elements of the attribute array
pub fn contains(a: &Value, b: &Value) -> bool {
    a.as_array().map_or(false, |items| items.iter().any(|item| equal(item, b)))
}

pub fn not_contains(a: &Value, b: &Value) -> bool {
    a.as_array().map_or(false, |items| !items.iter().any(|item| equal(item, b)))
}
