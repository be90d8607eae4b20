//! Structural equality over parameter tags.
//!
//! Decides whether two publishes or subscriptions describe the same request
//! shape. A missing tag only matches another missing tag.

use serde_json::{Number, Value};

/// Compare two optional parameter tags.
pub fn equal_params(x: Option<&Value>, y: Option<&Value>) -> bool {
    match (x, y) {
        (None, None) => true,
        (Some(x), Some(y)) => equal_values(x, y),
        _ => false,
    }
}

/// Deep equality: objects by key set and per-key value, arrays element-wise,
/// numbers by numeric value, everything else by value.
pub fn equal_values(x: &Value, y: &Value) -> bool {
    match (x, y) {
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, av)| b.get(key).is_some_and(|bv| equal_values(av, bv)))
        }
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(av, bv)| equal_values(av, bv))
        }
        (Value::Object(_), _) | (_, Value::Object(_)) => false,
        (Value::Array(_), _) | (_, Value::Array(_)) => false,
        (Value::Number(a), Value::Number(b)) => equal_numbers(a, b),
        _ => x == y,
    }
}

/// `1` and `1.0` are the same number; integers are compared exactly before
/// falling back to floating point.
fn equal_numbers(a: &Number, b: &Number) -> bool {
    if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
        return a == b;
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
