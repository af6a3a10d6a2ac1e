//! Canonical text form of a JSON value.
//!
//! Two-space indentation with object keys in lexicographic order. Used for
//! sizes, non-string reads, coercion to string, and the backing file.

use serde_json::Value as JsonValue;

use crate::error::Result;

/// Serialize `value` canonically.
///
/// `serde_json::Map` is a `BTreeMap` unless the `preserve_order` feature is
/// enabled, which this workspace never does; keys therefore come out sorted.
pub fn to_canonical_string(value: &JsonValue) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn to_canonical_bytes(value: &JsonValue) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalars() {
        assert_eq!(to_canonical_string(&json!(20)).unwrap(), "20");
        assert_eq!(to_canonical_string(&json!(2.5)).unwrap(), "2.5");
        assert_eq!(to_canonical_string(&json!(true)).unwrap(), "true");
        assert_eq!(to_canonical_string(&json!(null)).unwrap(), "null");
        assert_eq!(to_canonical_string(&json!("x")).unwrap(), "\"x\"");
    }

    #[test]
    fn keys_are_sorted_and_indented() {
        let value: JsonValue = serde_json::from_str(r#"{"b": [1], "a": {}}"#).unwrap();
        assert_eq!(
            to_canonical_string(&value).unwrap(),
            "{\n  \"a\": {},\n  \"b\": [\n    1\n  ]\n}"
        );
    }

    #[test]
    fn bytes_match_string() {
        let value = json!({"z": null, "y": [true, 1.5]});
        assert_eq!(
            to_canonical_bytes(&value).unwrap(),
            to_canonical_string(&value).unwrap().into_bytes()
        );
    }
}
