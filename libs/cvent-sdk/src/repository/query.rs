use serde_json::Value;

use super::Filters;

/// Merge caller filters with a repository's fixed parameters.
///
/// Filters win on key collision; parameters only fill in keys the filters
/// leave out.
#[must_use]
pub fn build_query(filters: &Filters, params: &Filters) -> Filters {
    let mut merged = filters.clone();
    for (key, value) in params {
        if !merged.contains_key(key) {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

/// Flatten a query map into `(key, value)` pairs for the URL query string.
///
/// Strings go out verbatim, numbers and booleans as their JSON text, `null`
/// is dropped, arrays repeat the key once per element and objects are sent
/// as JSON text.
pub fn encode_query(query: &Filters) -> Vec<(String, String)> {
    let mut pairs = Vec::with_capacity(query.len());
    for (key, value) in query {
        match value {
            Value::Array(items) => {
                pairs.extend(
                    items
                        .iter()
                        .filter_map(scalar_text)
                        .map(|text| (key.clone(), text)),
                );
            }
            other => {
                if let Some(text) = scalar_text(other) {
                    pairs.push((key.clone(), text));
                }
            }
        }
    }
    pairs
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
