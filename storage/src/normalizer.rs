//! Record normalizer: cleans extracted field values into storable scalar strings.
//!
//! - null → `None`
//! - object → compact JSON text (`None` when empty)
//! - array → elements joined with `", "`, strings unquoted, nulls skipped (`None` when empty)
//! - `false` and `0` → `None`
//! - string / number / `true` → trimmed text (`None` when empty after trim)

use serde_json::Value;

/// Normalizes a single extracted value.
pub fn normalize_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Object(map) if map.is_empty() => None,
        Value::Object(_) => serde_json::to_string(value).ok(),
        Value::Array(items) => {
            let joined = items
                .iter()
                .filter(|item| !item.is_null())
                .map(element_text)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(", ");
            non_empty(&joined)
        }
        Value::String(s) => non_empty(s),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Number(n) => non_empty(&n.to_string()),
        Value::Bool(false) => None,
        Value::Bool(true) => Some("true".to_string()),
    }
}

/// True when a stored value carries information: non-blank and not the `unknown` sentinel.
pub fn is_known_value(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty() && !trimmed.eq_ignore_ascii_case("unknown")
}

fn element_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_and_blank_become_none() {
        assert_eq!(normalize_value(&Value::Null), None);
        assert_eq!(normalize_value(&json!("   ")), None);
        assert_eq!(normalize_value(&json!({})), None);
        assert_eq!(normalize_value(&json!([])), None);
        assert_eq!(normalize_value(&json!([null, ""])), None);
    }

    #[test]
    fn test_false_and_zero_become_none() {
        assert_eq!(normalize_value(&json!(false)), None);
        assert_eq!(normalize_value(&json!(0)), None);
        assert_eq!(normalize_value(&json!(0.0)), None);
        assert_eq!(normalize_value(&json!(-3)), Some("-3".to_string()));
    }

    #[test]
    fn test_scalars_are_trimmed() {
        assert_eq!(normalize_value(&json!("  Madrid \n")), Some("Madrid".to_string()));
        assert_eq!(normalize_value(&json!(2025)), Some("2025".to_string()));
        assert_eq!(normalize_value(&json!(true)), Some("true".to_string()));
    }

    #[test]
    fn test_arrays_are_joined() {
        assert_eq!(
            normalize_value(&json!(["youth work", " climate ", null, 3])),
            Some("youth work, climate, 3".to_string())
        );
    }

    #[test]
    fn test_objects_serialize_to_parseable_json() {
        let original = json!({"email": "info@example.org", "phone": "+34 600 000 000"});
        let stored = normalize_value(&original).unwrap();

        let parsed: Value = serde_json::from_str(&stored).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_is_known_value() {
        assert!(is_known_value("Madrid"));
        assert!(!is_known_value("unknown"));
        assert!(!is_known_value(" UNKNOWN "));
        assert!(!is_known_value("   "));
    }
}
