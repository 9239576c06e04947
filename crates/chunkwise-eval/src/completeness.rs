//! Field completeness checks on extraction output.

use serde_json::Value;

/// Whether a value carries any content.
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

/// Split requested fields into (extracted, missing).
pub fn check_fields<S: AsRef<str>>(output: &Value, fields: &[S]) -> (Vec<String>, Vec<String>) {
    let mut extracted = Vec::new();
    let mut missing = Vec::new();
    for field in fields {
        let field = field.as_ref();
        match output.get(field) {
            Some(v) if is_present(v) => extracted.push(field.to_string()),
            _ => missing.push(field.to_string()),
        }
    }
    (extracted, missing)
}
