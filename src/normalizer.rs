//! Option normalization
//!
//! Generated option lists arrive in several shapes:
//!
//! ```text
//! [{"label": "Yes", "percentage": 42}]          array, numeric
//! [{"label": "Yes", "percentage": "42.5%"}]     array, string percentage
//! {"Yes": 42, "No": "58%"}                       plain label -> value map
//! [{"label": "Yes", "Gen Z": 40, "Boomers": 22}] per-segment columns
//! ```
//!
//! Everything here is total: bad numbers become 0.0, unknown shapes become
//! an empty list, nothing panics or returns an error.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::artifact::{CanonicalOption, DEFAULT_SEGMENT};

/// Keys that may carry a single-audience value
const VALUE_KEYS: [&str; 3] = ["percentage", "value", "percent"];

/// Parse a percentage-ish value to a finite, non-negative number
///
/// Numbers pass through; strings lose a trailing `%` and whitespace before
/// parsing. Anything unparseable, non-finite or negative is 0.0.
pub fn parse_percentage(raw: &Value) -> f64 {
    let parsed = match raw {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s
            .trim()
            .trim_end_matches('%')
            .trim_end()
            .parse::<f64>()
            .unwrap_or(0.0),
        _ => 0.0,
    };
    if parsed.is_finite() && parsed > 0.0 {
        parsed
    } else {
        0.0
    }
}

/// Normalize a single-audience option list
pub fn normalize_options(raw: &Value) -> Vec<CanonicalOption> {
    match raw {
        Value::Array(items) => items.iter().filter_map(single_from_item).collect(),
        Value::Object(map) => map
            .iter()
            .filter_map(|(label, value)| {
                Some(CanonicalOption::single(clean_label(label)?, parse_percentage(value)))
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Normalize a per-segment option list
///
/// Every returned option carries exactly the keys in `segment_names`; a
/// segment missing from the raw item gets 0.0.
pub fn normalize_comparison_options(raw: &Value, segment_names: &[String]) -> Vec<CanonicalOption> {
    match raw {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| segmented_from_item(item, segment_names))
            .collect(),
        Value::Object(map) => map
            .iter()
            .filter_map(|(label, value)| {
                Some(CanonicalOption {
                    label: clean_label(label)?,
                    values: segment_values(value.as_object(), segment_names),
                })
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Labels are trimmed; blank labels drop the option in every input shape
fn clean_label(label: &str) -> Option<String> {
    let label = label.trim();
    (!label.is_empty()).then(|| label.to_string())
}

fn label_of(item: &Value) -> Option<String> {
    match item {
        Value::String(s) => clean_label(s),
        Value::Object(obj) => clean_label(obj.get("label")?.as_str()?),
        _ => None,
    }
}

fn single_from_item(item: &Value) -> Option<CanonicalOption> {
    let label = label_of(item)?;
    let value = item
        .as_object()
        .and_then(|obj| {
            VALUE_KEYS
                .iter()
                .find_map(|key| obj.get(*key))
                .or_else(|| obj.get("values").and_then(|v| v.get(DEFAULT_SEGMENT)))
        })
        .map(parse_percentage)
        .unwrap_or(0.0);
    Some(CanonicalOption::single(label, value))
}

fn segmented_from_item(item: &Value, segment_names: &[String]) -> Option<CanonicalOption> {
    let label = label_of(item)?;
    let obj = item.as_object();
    // Already-canonical items keep their numbers under "values"
    let source = obj
        .and_then(|o| o.get("values"))
        .and_then(Value::as_object)
        .or(obj);
    Some(CanonicalOption {
        label,
        values: segment_values(source, segment_names),
    })
}

fn segment_values(source: Option<&Map<String, Value>>, segment_names: &[String]) -> BTreeMap<String, f64> {
    segment_names
        .iter()
        .map(|segment| {
            let value = source
                .and_then(|s| s.get(segment))
                .map(parse_percentage)
                .unwrap_or(0.0);
            (segment.clone(), value)
        })
        .collect()
}
