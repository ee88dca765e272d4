//! Serialize `Vec<(String, V)>` as a JSON object that keeps insertion order.
//!
//! Regime tables are keyed by label and must come out in order of first
//! appearance, which a `HashMap` cannot give and a `BTreeMap` would re-sort.
//!
//! Usage: `#[serde(with = "wheellab_core::ordered")]`.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

pub fn serialize<S, V>(entries: &[(String, V)], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    V: Serialize,
{
    serializer.collect_map(entries.iter().map(|(k, v)| (k, v)))
}

pub fn deserialize<'de, D, V>(deserializer: D) -> Result<Vec<(String, V)>, D::Error>
where
    D: Deserializer<'de>,
    V: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(Vec::new()),
        Value::Object(map) => map
            .into_iter()
            .map(|(k, v)| {
                serde_json::from_value(v)
                    .map(|v| (k, v))
                    .map_err(D::Error::custom)
            })
            .collect(),
        other => Err(D::Error::custom(format!("expected an object, got {other}"))),
    }
}

/// Look up an entry by key.
pub fn get<'a, V>(entries: &'a [(String, V)], key: &str) -> Option<&'a V> {
    entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Table {
        #[serde(with = "super")]
        rows: Vec<(String, u32)>,
    }

    #[test]
    fn keeps_insertion_order() {
        let t = Table {
            rows: vec![("zeta".into(), 1), ("alpha".into(), 2)],
        };
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, r#"{"rows":{"zeta":1,"alpha":2}}"#);
        let back: Table = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn null_is_empty() {
        let t: Table = serde_json::from_str(r#"{"rows":null}"#).unwrap();
        assert!(t.rows.is_empty());
    }

    #[test]
    fn rejects_non_object() {
        assert!(serde_json::from_str::<Table>(r#"{"rows":[1,2]}"#).is_err());
    }

    #[test]
    fn get_finds_by_key() {
        let rows = vec![("a".to_string(), 1), ("b".to_string(), 2)];
        assert_eq!(get(&rows, "b"), Some(&2));
        assert_eq!(get(&rows, "c"), None);
    }
}
