//! Response payload normalisation
//!
//! The transport layer accepts payloads made of maps, sequences, strings,
//! numbers and booleans. Null map entries are dropped; a null anywhere else
//! has no representation and rejects the payload.

use crate::types::JsonValue;

/// Bring a payload into transport form, or say where it breaks the contract
pub(crate) fn normalize(value: JsonValue) -> Result<JsonValue, String> {
    let mut path = String::from("$");
    normalize_at(value, &mut path)
}

fn normalize_at(value: JsonValue, path: &mut String) -> Result<JsonValue, String> {
    match value {
        JsonValue::Null => Err(format!("null value at {path}")),
        JsonValue::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, child) in map {
                if child.is_null() {
                    continue;
                }
                let len = path.len();
                path.push('.');
                path.push_str(&key);
                let child = normalize_at(child, path)?;
                path.truncate(len);
                out.insert(key, child);
            }
            Ok(JsonValue::Object(out))
        }
        JsonValue::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (i, child) in items.into_iter().enumerate() {
                let len = path.len();
                path.push_str(&format!("[{i}]"));
                let child = normalize_at(child, path)?;
                path.truncate(len);
                out.push(child);
            }
            Ok(JsonValue::Array(out))
        }
        primitive => Ok(primitive),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_prunes_null_map_entries() {
        let payload = json!({
            "entries": [{"username": "adams", "middleName": null}],
            "cookie": null
        });
        assert_eq!(
            normalize(payload).unwrap(),
            json!({"entries": [{"username": "adams"}]})
        );
    }

    #[test]
    fn test_rejects_null_in_sequence() {
        let err = normalize(json!({"entries": [{"a": 1}, null]})).unwrap_err();
        assert_eq!(err, "null value at $.entries[1]");
    }

    #[test]
    fn test_rejects_top_level_null() {
        assert!(normalize(JsonValue::Null).is_err());
    }

    #[test]
    fn test_primitives_pass_through() {
        assert_eq!(normalize(json!("text")).unwrap(), json!("text"));
        assert_eq!(normalize(json!([1, true, "x"])).unwrap(), json!([1, true, "x"]));
    }
}
