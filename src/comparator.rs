//! Pluggable field equality policies

use crate::error::{LogdiffError, Result};
use crate::hooks::{ComparatorFn, FunctionRegistry};
use crate::sanitize::sanitized;
use crate::value::Value;
use std::collections::HashMap;
use std::fmt;

/// Relative tolerance used by `compare_equals` for floats
pub const DEFAULT_RELATIVE_TOLERANCE: f64 = 1e-9;

/// Dispatches comparisons to named comparator functions
#[derive(Clone, Default)]
pub struct Comparator {
    table: HashMap<String, ComparatorFn>,
}

impl fmt::Debug for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.table.keys().collect();
        names.sort();
        f.debug_struct("Comparator").field("registered", &names).finish()
    }
}

impl Comparator {
    pub fn new(registry: &FunctionRegistry) -> Self {
        Self {
            table: registry.comparators().clone(),
        }
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    /// Compare two field values with the comparator called `name`.
    ///
    /// Nulls and lists are handled here: two nulls are equal, a null never
    /// equals a value, and lists are equal when they have the same length
    /// and every pair of elements compares equal. Scalars are sanitized and
    /// handed to the named function.
    pub fn compare(&self, name: &str, args: &Value, expected: &Value, got: &Value) -> Result<bool> {
        match (expected, got) {
            (Value::Null, Value::Null) => Ok(true),
            (Value::Null, _) | (_, Value::Null) => Ok(false),
            (Value::List(expected), Value::List(got)) => {
                if expected.len() != got.len() {
                    return Ok(false);
                }
                for (e, g) in expected.iter().zip(got) {
                    if !self.compare(name, args, e, g)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            (Value::List(_), _) | (_, Value::List(_)) => Ok(false),
            _ => {
                let function = self
                    .table
                    .get(name)
                    .ok_or_else(|| LogdiffError::comparator_lookup(name))?;
                Ok(function(args, &sanitized(expected), &sanitized(got)))
            }
        }
    }
}

/// Default equality policy.
///
/// Raw equality first, then both values are unified to a common type
/// (string, then float, then int). Strings then compare case-insensitively
/// and finite floats within a relative tolerance of 1e-9.
pub fn compare_equals(_args: &Value, expected: &Value, got: &Value) -> bool {
    if expected == got {
        return true;
    }

    let Some((expected, got)) = unify(expected, got) else {
        return false;
    };

    if expected == got {
        return true;
    }

    match (&expected, &got) {
        (Value::Str(a), Value::Str(b)) => a.to_lowercase() == b.to_lowercase(),
        (Value::Float(a), Value::Float(b)) => within_tolerance(*a, *b, 0.0, DEFAULT_RELATIVE_TOLERANCE),
        _ => false,
    }
}

/// Raw equality only
pub fn compare_exact(_args: &Value, expected: &Value, got: &Value) -> bool {
    expected == got
}

/// Numeric comparison with `{"relative": r, "absolute": a}` tolerances;
/// anything non-numeric falls back to [`compare_equals`]
pub fn compare_tolerance(args: &Value, expected: &Value, got: &Value) -> bool {
    let relative = numeric_arg(args, "relative").unwrap_or(DEFAULT_RELATIVE_TOLERANCE);
    let absolute = numeric_arg(args, "absolute").unwrap_or(0.0);

    match (expected.as_f64(), got.as_f64()) {
        (Some(a), Some(b)) => a == b || within_tolerance(a, b, absolute, relative),
        _ => compare_equals(args, expected, got),
    }
}

fn numeric_arg(args: &Value, name: &str) -> Option<f64> {
    args.as_map()?.get(name)?.as_f64()
}

fn within_tolerance(a: f64, b: f64, absolute: f64, relative: f64) -> bool {
    if !a.is_finite() || !b.is_finite() {
        return false;
    }
    (a - b).abs() <= absolute.max(relative * a.abs().max(b.abs()))
}

fn unify(a: &Value, b: &Value) -> Option<(Value, Value)> {
    let either = |pred: fn(&Value) -> bool| pred(a) || pred(b);

    if either(|v| matches!(v, Value::Str(_))) {
        Some((Value::Str(a.to_string()), Value::Str(b.to_string())))
    } else if either(|v| matches!(v, Value::Float(_))) {
        Some((Value::Float(as_float(a)?), Value::Float(as_float(b)?)))
    } else if either(|v| matches!(v, Value::Int(_))) {
        Some((Value::Int(as_int(a)?), Value::Int(as_int(b)?)))
    } else {
        Some((a.clone(), b.clone()))
    }
}

fn as_float(v: &Value) -> Option<f64> {
    match v {
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        other => other.as_f64(),
    }
}

fn as_int(v: &Value) -> Option<i64> {
    match v {
        Value::Int(i) => Some(*i),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}
