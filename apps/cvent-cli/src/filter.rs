use cvent_sdk::Filters;
use serde_json::Value;

/// Parse one `--filter key=value` argument.
///
/// The value is read as a JSON scalar when it is one (`10`, `true`, `null`),
/// anything else stays a plain string.
pub fn parse_filter(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{raw}`"))?;

    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty filter key in `{raw}`"));
    }

    let value = match serde_json::from_str::<Value>(value) {
        Ok(v @ (Value::Number(_) | Value::Bool(_) | Value::Null)) => v,
        _ => Value::String(value.to_owned()),
    };
    Ok((key.to_owned(), value))
}

/// Fold parsed pairs into a filter map. A repeated key collects its values into an array.
pub fn collect_filters(pairs: Vec<(String, Value)>) -> Filters {
    let mut filters = Filters::new();
    for (key, value) in pairs {
        match filters.get_mut(&key) {
            None => {
                filters.insert(key, value);
            }
            Some(Value::Array(values)) => values.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
        }
    }
    filters
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strings_stay_strings() {
        assert_eq!(
            parse_filter("city=NYC").unwrap(),
            ("city".to_owned(), json!("NYC"))
        );
        // only the first '=' splits
        assert_eq!(
            parse_filter("expr=a=b").unwrap(),
            ("expr".to_owned(), json!("a=b"))
        );
    }

    #[test]
    fn scalars_are_typed() {
        assert_eq!(parse_filter("limit=10").unwrap().1, json!(10));
        assert_eq!(parse_filter("deleted=false").unwrap().1, json!(false));
        assert_eq!(parse_filter("x=null").unwrap().1, Value::Null);
    }

    #[test]
    fn structured_json_is_kept_as_text() {
        assert_eq!(parse_filter("ids=[1,2]").unwrap().1, json!("[1,2]"));
        assert_eq!(parse_filter("q={}").unwrap().1, json!("{}"));
    }

    #[test]
    fn malformed_arguments_are_rejected() {
        assert!(parse_filter("novalue").is_err());
        assert!(parse_filter("=x").is_err());
    }

    #[test]
    fn repeated_keys_become_arrays() {
        let filters = collect_filters(vec![
            ("status".to_owned(), json!("Accepted")),
            ("city".to_owned(), json!("NYC")),
            ("status".to_owned(), json!("Pending")),
            ("status".to_owned(), json!("Cancelled")),
        ]);

        assert_eq!(filters["city"], json!("NYC"));
        assert_eq!(
            filters["status"],
            json!(["Accepted", "Pending", "Cancelled"])
        );
    }
}
