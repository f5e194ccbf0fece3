//! Cache Key Module
//!
//! Derives cache keys from a resource identifier and optional request params.
//!
//! A key is the identifier followed by the JSON form of the params, e.g.
//! `/products{"page":1}`. Pattern invalidation matches substrings of these
//! keys, so their textual form is part of the cache's contract.

use std::str::FromStr;

use serde_json::Value;

// == Key Mode ==
/// How params are serialized into a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyMode {
    /// Object keys sorted recursively, so structurally equal params always
    /// produce the same key.
    #[default]
    Canonical,
    /// Params serialized as-is, fields in the order they were inserted, so
    /// the same params built in a different order get a different key.
    Naive,
}

impl FromStr for KeyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "canonical" => Ok(KeyMode::Canonical),
            "naive" => Ok(KeyMode::Naive),
            other => Err(format!("unknown key mode '{}'", other)),
        }
    }
}

// == Derive Key ==
/// Builds the cache key for `identifier` and `params`.
///
/// Absent or `null` params yield the identifier alone.
pub fn derive_key(identifier: &str, params: Option<&Value>, mode: KeyMode) -> String {
    let mut key = String::from(identifier);
    match params {
        None | Some(Value::Null) => {}
        Some(params) => match mode {
            KeyMode::Canonical => write_canonical(params, &mut key),
            KeyMode::Naive => key.push_str(&params.to_string()),
        },
    }
    key
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut fields: Vec<(&String, &Value)> = map.iter().collect();
            fields.sort_by(|a, b| a.0.cmp(b.0));

            out.push('{');
            for (i, (name, field)) in fields.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(name.clone()).to_string());
                out.push(':');
                write_canonical(field, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    #[test]
    fn test_key_without_params() {
        assert_eq!(derive_key("/products", None, KeyMode::Canonical), "/products");
        assert_eq!(
            derive_key("/products", Some(&Value::Null), KeyMode::Canonical),
            "/products"
        );
    }

    #[test]
    fn test_key_with_params() {
        let params = json!({"page": 1});
        assert_eq!(
            derive_key("/products", Some(&params), KeyMode::Canonical),
            r#"/products{"page":1}"#
        );
    }

    #[test]
    fn test_empty_object_params_are_kept() {
        let params = json!({});
        assert_eq!(derive_key("/cart", Some(&params), KeyMode::Naive), "/cart{}");
    }

    #[test]
    fn test_canonical_ignores_insertion_order() {
        let mut first = Map::new();
        first.insert("page".into(), json!(2));
        first.insert("limit".into(), json!(20));
        first.insert("filter".into(), json!({"z": true, "a": [3, {"y": 1, "b": 2}]}));

        let mut second = Map::new();
        second.insert("filter".into(), json!({"a": [3, {"b": 2, "y": 1}], "z": true}));
        second.insert("limit".into(), json!(20));
        second.insert("page".into(), json!(2));

        let a = derive_key("/products", Some(&Value::Object(first)), KeyMode::Canonical);
        let b = derive_key("/products", Some(&Value::Object(second)), KeyMode::Canonical);

        assert_eq!(a, b);
        assert_eq!(
            a,
            r#"/products{"filter":{"a":[3,{"b":2,"y":1}],"z":true},"limit":20,"page":2}"#
        );
    }

    #[test]
    fn test_naive_keeps_field_order() {
        let params: Value = serde_json::from_str(r#"{"page":1,"limit":20}"#).unwrap();

        assert_eq!(
            derive_key("/products", Some(&params), KeyMode::Naive),
            r#"/products{"page":1,"limit":20}"#
        );
        assert_eq!(
            derive_key("/products", Some(&params), KeyMode::Canonical),
            r#"/products{"limit":20,"page":1}"#
        );
    }

    #[test]
    fn test_naive_distinguishes_field_order() {
        let forward = json!({"page": 1, "limit": 20});
        let backward = json!({"limit": 20, "page": 1});

        assert_ne!(
            derive_key("/products", Some(&forward), KeyMode::Naive),
            derive_key("/products", Some(&backward), KeyMode::Naive)
        );
        assert_eq!(
            derive_key("/products", Some(&forward), KeyMode::Canonical),
            derive_key("/products", Some(&backward), KeyMode::Canonical)
        );
    }

    #[test]
    fn test_canonical_escapes_strings() {
        let params = json!({"q": "a\"b"});
        assert_eq!(
            derive_key("/search", Some(&params), KeyMode::Canonical),
            r#"/search{"q":"a\"b"}"#
        );
    }

    #[test]
    fn test_distinct_identifiers_do_not_collide() {
        let params = json!({"page": 1});
        assert_ne!(
            derive_key("/products", Some(&params), KeyMode::Canonical),
            derive_key("/categories", Some(&params), KeyMode::Canonical)
        );
    }

    #[test]
    fn test_key_mode_from_str() {
        assert_eq!("canonical".parse::<KeyMode>().unwrap(), KeyMode::Canonical);
        assert_eq!("NAIVE".parse::<KeyMode>().unwrap(), KeyMode::Naive);
        assert!("sorted".parse::<KeyMode>().is_err());
    }
}
