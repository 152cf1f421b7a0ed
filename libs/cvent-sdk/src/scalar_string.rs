//! Deserialize a string from any scalar.
//!
//! Configuration sources type bare values on their own: YAML reads
//! `client_id: 12345` as an integer. Credentials are opaque strings, so
//! numbers are accepted and rendered back as text.
//!
//! ```ignore
//! #[serde(deserialize_with = "crate::scalar_string::deserialize")]
//! client_id: String,
//! ```

use std::fmt;

use serde::Deserializer;
use serde::de::{self, Visitor};

/// Accepts strings, chars, integers and floats.
///
/// # Errors
/// Fails for booleans, sequences, maps and unit.
pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(ScalarVisitor)
}

struct ScalarVisitor;

impl Visitor<'_> for ScalarVisitor {
    type Value = String;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string or a number")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
        Ok(v.to_owned())
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
        Ok(v)
    }

    fn visit_char<E: de::Error>(self, v: char) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_i128<E: de::Error>(self, v: i128) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<String, E> {
        Ok(v.to_string())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Holder {
        #[serde(deserialize_with = "crate::scalar_string::deserialize")]
        value: String,
    }

    fn read(json: &str) -> Result<String, serde_json::Error> {
        serde_json::from_str::<Holder>(json).map(|h| h.value)
    }

    #[test]
    fn strings_pass_through() {
        assert_eq!(read(r#"{"value":"abc"}"#).unwrap(), "abc");
        assert_eq!(read(r#"{"value":"00123"}"#).unwrap(), "00123");
    }

    #[test]
    fn numbers_become_text() {
        assert_eq!(read(r#"{"value":12345}"#).unwrap(), "12345");
        assert_eq!(read(r#"{"value":-7}"#).unwrap(), "-7");
        assert_eq!(read(r#"{"value":1.5}"#).unwrap(), "1.5");
    }

    #[test]
    fn non_scalars_are_rejected() {
        assert!(read(r#"{"value":true}"#).is_err());
        assert!(read(r#"{"value":[1]}"#).is_err());
        assert!(read(r#"{"value":{}}"#).is_err());
    }
}
