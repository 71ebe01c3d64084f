//! Coercion of raw tokens into canonical typed values

use crate::value::Value;

/// Canonicalize a value.
///
/// Integral floats collapse to ints, strings are whitespace-collapsed and
/// then read as a bool, NaN, infinity or number when they spell one. Lists
/// and maps are sanitized element-wise. Applying it twice gives the same
/// result as applying it once.
pub fn sanitize(value: Value) -> Value {
    match value {
        Value::Null | Value::Bool(_) | Value::Int(_) => value,
        Value::Float(f) => collapse_float(f),
        Value::Str(s) => sanitize_str(&s),
        Value::List(items) => Value::List(items.into_iter().map(sanitize).collect()),
        Value::Map(map) => Value::Map(map.into_iter().map(|(k, v)| (k, sanitize(v))).collect()),
    }
}

/// Sanitize a borrowed value without giving up the original
pub fn sanitized(value: &Value) -> Value {
    sanitize(value.clone())
}

/// Collapse runs of whitespace into single spaces and trim the ends
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collapse_float(f: f64) -> Value {
    // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Value::Int(f as i64)
    } else {
        Value::Float(f)
    }
}

fn sanitize_str(raw: &str) -> Value {
    let s = collapse_whitespace(raw);

    match s.to_ascii_lowercase().as_str() {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "nan" => return Value::Float(f64::NAN),
        "inf" => return Value::Float(f64::INFINITY),
        "-inf" => return Value::Float(f64::NEG_INFINITY),
        _ => {}
    }

    if let Ok(i) = s.parse::<i64>() {
        return Value::Int(i);
    }

    // Rust also parses "infinity"/"nan" spellings; only plain numerals count here
    if looks_numeric(&s) {
        if let Ok(f) = s.parse::<f64>() {
            return collapse_float(f);
        }
    }

    Value::Str(s)
}

fn looks_numeric(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_digit())
        && s
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
}
