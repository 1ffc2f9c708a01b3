//! Tool payload extraction helpers
//!
//! Backends sometimes return array fields (`questions`, `options`, `themes`)
//! as a JSON document encoded in a string, occasionally with bare `45%`
//! tokens that are not valid JSON. These helpers detect that by type,
//! repair the percentages and parse. Anything still unparseable is an
//! empty list.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static BARE_PERCENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([:\[,]\s*)(-?\d+(?:\.\d+)?)\s*%"#).expect("static regex")
});

/// Quote bare `NN%` tokens so the text parses as JSON
pub fn sanitize_bare_percentages(text: &str) -> Cow<'_, str> {
    BARE_PERCENT.replace_all(text, r#"${1}"${2}%""#)
}

/// Parse a string-encoded JSON document, repairing bare percentages
///
/// Valid JSON parses untouched; the repair only runs when the raw text fails.
pub fn parse_embedded_json(text: &str) -> serde_json::Result<Value> {
    serde_json::from_str(text).or_else(|e| match sanitize_bare_percentages(text) {
        Cow::Owned(fixed) => serde_json::from_str(&fixed),
        Cow::Borrowed(_) => Err(e),
    })
}

/// Read an array-typed field that may have arrived as a JSON string
pub fn coerce_array(raw: &Value) -> Vec<Value> {
    match raw {
        Value::Array(items) => items.clone(),
        Value::String(text) => match parse_embedded_json(text) {
            Ok(Value::Array(items)) => items,
            Ok(other) => {
                tracing::warn!(kind = json_kind(&other), "String-encoded field is not an array");
                Vec::new()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not parse string-encoded array field");
                Vec::new()
            }
        },
        Value::Null => Vec::new(),
        other => {
            tracing::warn!(kind = json_kind(other), "Expected an array field");
            Vec::new()
        }
    }
}

/// Like [`coerce_array`] but keeps a plain object (label -> value maps) as-is
pub fn coerce_options(raw: &Value) -> Value {
    match raw {
        Value::Object(_) => raw.clone(),
        Value::String(text) => match parse_embedded_json(text) {
            Ok(v @ (Value::Array(_) | Value::Object(_))) => v,
            _ => {
                tracing::warn!("Could not parse string-encoded options");
                Value::Array(Vec::new())
            }
        },
        other => Value::Array(coerce_array(other)),
    }
}

/// Non-empty trimmed string field
pub fn str_field(obj: &Value, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Positive integer field, accepting numeric strings
pub fn count_field(obj: &Value, key: &str) -> Option<u32> {
    let n = match obj.get(key)? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (n.is_finite() && n >= 1.0 && n <= u32::MAX as f64).then(|| n.round() as u32)
}

/// Strings from an array field, or a comma-separated string
pub fn string_list(raw: &Value) -> Vec<String> {
    let items: Vec<String> = match raw {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Value::String(s) => s.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    };
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sanitize_quotes_bare_percentages() {
        let text = r#"[{"label": "Yes", "percentage": 45%}, {"label": "No", "percentage":55.5 %}]"#;
        let fixed = sanitize_bare_percentages(text);
        let parsed: Value = serde_json::from_str(&fixed).unwrap();
        assert_eq!(parsed[0]["percentage"], "45%");
        assert_eq!(parsed[1]["percentage"], "55.5%");
    }

    #[test]
    fn test_sanitize_leaves_quoted_values() {
        let text = r#"{"percentage": "45%"}"#;
        assert_eq!(sanitize_bare_percentages(text), text);
    }

    #[test]
    fn test_parse_embedded_json_repairs_only_invalid_text() {
        let valid = r#"{"questionText": "Rate: 45% or more?"}"#;
        assert_eq!(parse_embedded_json(valid).unwrap()["questionText"], "Rate: 45% or more?");

        let bare = r#"{"sampleSize": 300, "options": [{"label": "Yes", "percentage": 61%}]}"#;
        let parsed = parse_embedded_json(bare).unwrap();
        assert_eq!(parsed["options"][0]["percentage"], "61%");

        assert!(parse_embedded_json("{not json").is_err());
    }

    #[test]
    fn test_coerce_native_and_encoded_arrays() {
        assert_eq!(coerce_array(&json!([1, 2])).len(), 2);
        let encoded = json!(r#"[{"title": "Q1", "options": [{"label": "A", "percentage": 20%}]}]"#);
        let items = coerce_array(&encoded);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["options"][0]["percentage"], "20%");
    }

    #[test]
    fn test_coerce_garbage_is_empty() {
        assert!(coerce_array(&json!("[{broken")).is_empty());
        assert!(coerce_array(&json!(r#"{"not": "array"}"#)).is_empty());
        assert!(coerce_array(&json!(42)).is_empty());
        assert!(coerce_array(&Value::Null).is_empty());
    }

    #[test]
    fn test_coerce_options_keeps_maps() {
        let map = json!({"Yes": 60});
        assert_eq!(coerce_options(&map), map);
        let encoded = json!(r#"{"Yes": 60%}"#);
        assert_eq!(coerce_options(&encoded)["Yes"], "60%");
        assert_eq!(coerce_options(&json!("???")), json!([]));
    }

    #[test]
    fn test_count_field() {
        let obj = json!({"a": 500, "b": "250", "c": "many", "d": 0, "e": -3});
        assert_eq!(count_field(&obj, "a"), Some(500));
        assert_eq!(count_field(&obj, "b"), Some(250));
        assert_eq!(count_field(&obj, "c"), None);
        assert_eq!(count_field(&obj, "d"), None);
        assert_eq!(count_field(&obj, "e"), None);
        assert_eq!(count_field(&obj, "missing"), None);
    }

    #[test]
    fn test_string_list() {
        assert_eq!(string_list(&json!(["A", " ", "B"])), vec!["A", "B"]);
        assert_eq!(string_list(&json!("Gen Z, Boomers")), vec!["Gen Z", "Boomers"]);
        assert!(string_list(&json!(3)).is_empty());
    }
}
