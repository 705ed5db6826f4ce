//! Render JSON values for error messages.

use serde_json::Value;

/// Render a value followed by its kind, e.g. `'_' (string)` or `[1,2] (array)`
///
/// `null` carries no kind suffix.
pub fn inspect_with_kind(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::String(s) => format!("'{}' (string)", s),
        Value::Bool(b) => format!("{} (boolean)", b),
        Value::Number(n) => format!("{} (number)", n),
        Value::Array(_) => format!("{} (array)", value),
        Value::Object(_) => format!("{} (object)", value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_inspect_scalars() {
        assert_eq!(inspect_with_kind(&json!("_")), "'_' (string)");
        assert_eq!(inspect_with_kind(&json!(true)), "true (boolean)");
        assert_eq!(inspect_with_kind(&json!(42)), "42 (number)");
        assert_eq!(inspect_with_kind(&Value::Null), "null");
    }

    #[test]
    fn test_inspect_containers() {
        assert_eq!(inspect_with_kind(&json!([-0.0])), "[-0.0] (array)");
        assert_eq!(inspect_with_kind(&json!({"a": 1})), "{\"a\":1} (object)");
    }
}
