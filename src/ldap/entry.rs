//! Directory entries

use super::dn::Dn;
use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};
use base64::Engine as _;
use std::collections::BTreeMap;
use std::fmt;

/// A single typed attribute value
///
/// The variant is the attribute's declared type and decides how filter
/// comparisons order values.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryValue {
    String(String),
    Number(f64),
    Boolean(bool),
    Binary(Vec<u8>),
}

impl EntryValue {
    /// Convert a JSON primitive to a value, `None` for non-primitives
    pub fn from_json(value: &JsonValue) -> Option<Self> {
        match value {
            JsonValue::String(s) => Some(Self::String(s.clone())),
            JsonValue::Number(n) => n.as_f64().map(Self::Number),
            JsonValue::Bool(b) => Some(Self::Boolean(*b)),
            _ => None,
        }
    }

    /// JSON form; binary values are base64 encoded
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::String(s) => JsonValue::String(s.clone()),
            Self::Number(n) => serde_json::Number::from_f64(*n)
                .map_or(JsonValue::String(n.to_string()), JsonValue::Number),
            Self::Boolean(b) => JsonValue::Bool(*b),
            Self::Binary(bytes) => {
                JsonValue::String(base64::engine::general_purpose::STANDARD.encode(bytes))
            }
        }
    }
}

impl fmt::Display for EntryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Self::Number(n) => write!(f, "{n}"),
            Self::Boolean(true) => f.write_str("TRUE"),
            Self::Boolean(false) => f.write_str("FALSE"),
            Self::Binary(bytes) => f.write_str(&base64::engine::general_purpose::STANDARD.encode(bytes)),
        }
    }
}

impl serde::Serialize for EntryValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> serde::Deserialize<'de> for EntryValue {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = JsonValue::deserialize(deserializer)?;
        Self::from_json(&value).ok_or_else(|| {
            serde::de::Error::custom(format!("expected a string, number or boolean, got {value}"))
        })
    }
}

impl From<&str> for EntryValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for EntryValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<f64> for EntryValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for EntryValue {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<bool> for EntryValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct EntryAttribute {
    name: String,
    values: Vec<EntryValue>,
}

/// A directory entry: a DN plus multi-valued attributes
///
/// Attribute names are matched case-insensitively; the spelling used when the
/// attribute was first added is kept for display.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    dn: Dn,
    attributes: BTreeMap<String, EntryAttribute>,
}

impl Entry {
    pub fn new(dn: Dn) -> Self {
        Self {
            dn,
            attributes: BTreeMap::new(),
        }
    }

    /// Build an entry from a JSON object
    ///
    /// Primitive members become single-valued attributes, arrays become
    /// multi-valued attributes and nulls are skipped.
    pub fn from_json(dn: Dn, object: &JsonValue) -> Result<Self> {
        let map = object
            .as_object()
            .ok_or_else(|| Error::config(format!("Entry '{dn}' must be a JSON object")))?;

        let mut entry = Entry::new(dn);
        for (name, value) in map {
            let values = match value {
                JsonValue::Null => continue,
                JsonValue::Array(items) => items
                    .iter()
                    .filter(|item| !item.is_null())
                    .map(|item| {
                        EntryValue::from_json(item).ok_or_else(|| {
                            Error::config(format!(
                                "Attribute '{name}' of '{}' has a non-primitive value",
                                entry.dn
                            ))
                        })
                    })
                    .collect::<Result<Vec<_>>>()?,
                other => vec![EntryValue::from_json(other).ok_or_else(|| {
                    Error::config(format!(
                        "Attribute '{name}' of '{}' has a non-primitive value",
                        entry.dn
                    ))
                })?],
            };
            entry.add_values(name, values);
        }
        Ok(entry)
    }

    /// Add a single-valued attribute while building
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<EntryValue>) -> Self {
        self.add_values(name, vec![value.into()]);
        self
    }

    /// Add values to an attribute, creating it if needed
    pub fn add_values(&mut self, name: &str, values: Vec<EntryValue>) {
        if values.is_empty() {
            return;
        }
        self.attributes
            .entry(name.to_ascii_lowercase())
            .or_insert_with(|| EntryAttribute {
                name: name.to_string(),
                values: Vec::new(),
            })
            .values
            .extend(values);
    }

    /// Replace all values of an attribute; an empty list removes it
    pub fn replace_values(&mut self, name: &str, values: Vec<EntryValue>) {
        self.attributes.remove(&name.to_ascii_lowercase());
        self.add_values(name, values);
    }

    /// Remove specific values, or the whole attribute when `values` is empty
    pub fn remove_values(&mut self, name: &str, values: &[EntryValue]) {
        let key = name.to_ascii_lowercase();
        if values.is_empty() {
            self.attributes.remove(&key);
            return;
        }
        if let Some(attr) = self.attributes.get_mut(&key) {
            attr.values.retain(|v| !values.contains(v));
            if attr.values.is_empty() {
                self.attributes.remove(&key);
            }
        }
    }

    pub fn dn(&self) -> &Dn {
        &self.dn
    }

    /// Values of an attribute
    pub fn get(&self, name: &str) -> Option<&[EntryValue]> {
        self.attributes
            .get(&name.to_ascii_lowercase())
            .map(|a| a.values.as_slice())
    }

    /// First value of an attribute
    pub fn first(&self, name: &str) -> Option<&EntryValue> {
        self.get(name).and_then(<[EntryValue]>::first)
    }

    /// Whether the attribute is present with at least one value
    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some_and(|v| !v.is_empty())
    }

    /// Attribute names as first added
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.values().map(|a| a.name.as_str())
    }

    /// JSON form: `{"dn": "...", "attributes": {"name": [values]}}`
    ///
    /// When `only` is non-empty, only those attributes are included.
    pub fn to_json(&self, only: &[String]) -> JsonValue {
        let mut attributes = JsonObject::new();
        for (key, attr) in &self.attributes {
            if !only.is_empty() && !only.iter().any(|o| o.eq_ignore_ascii_case(key)) {
                continue;
            }
            attributes.insert(
                attr.name.clone(),
                JsonValue::Array(attr.values.iter().map(EntryValue::to_json).collect()),
            );
        }
        serde_json::json!({
            "dn": self.dn.to_string(),
            "attributes": attributes,
        })
    }
}
