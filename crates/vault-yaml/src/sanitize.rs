//! Key sanitizing for field mappings
//!
//! Vault's write API takes a JSON object, so every field name must be a
//! string. YAML happily parses `8080: open` or `true: yes` with non-string
//! keys; those are coerced to their string form before submission.

use serde_yaml::{Mapping, Value};

/// Replace every non-string key with its string form.
///
/// Values and relative order are preserved. When two keys collide after
/// coercion (`1` and `"1"`), the later value wins at the earlier position.
pub fn sanitize(fields: Mapping) -> Mapping {
    let mut sanitized = Mapping::with_capacity(fields.len());
    for (key, value) in fields {
        let key = match key {
            Value::String(s) => s,
            other => key_to_string(&other),
        };
        sanitized.insert(Value::String(key), value);
    }
    sanitized
}

/// String form of a YAML key
pub fn key_to_string(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Tagged(tagged) => format!("{} {}", tagged.tag, key_to_string(&tagged.value)),
        Value::Sequence(_) | Value::Mapping(_) => serde_yaml::to_string(key)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_else(|_| format!("{:?}", key)),
    }
}
