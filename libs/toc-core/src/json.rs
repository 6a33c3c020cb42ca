//! Lenient readers for loosely typed JSON written by admins and importers.

use serde_json::Value;

/// Read an integer from a JSON number or a numeric string.
///
/// Fractional values are truncated toward zero. Booleans, nulls and
/// non-numeric strings yield `None`.
pub(crate) fn lenient_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
        }
        _ => None,
    }
}

/// Like [`lenient_int`] but narrowed to a positive chapter number.
pub(crate) fn positive_number(value: &Value) -> Option<i32> {
    lenient_int(value)
        .filter(|n| *n > 0)
        .and_then(|n| i32::try_from(n).ok())
}

/// Read a display string; numbers are rendered, other kinds are ignored.
pub(crate) fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
