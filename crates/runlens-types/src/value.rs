use serde_json::Value;

/// Render a JSON value for agent-readable `key: value` output.
///
/// Strings lose their quotes; everything else falls back to compact JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
