//! Property set types

use crate::error::{Error, Result};
use crate::types::{DataType, JsonValue};
use std::collections::BTreeMap;
use std::fmt;

/// A typed property value
#[derive(Clone, PartialEq)]
pub enum PropertyValue {
    String(String),
    /// Secret value, never printed
    Password(String),
    Boolean(bool),
    Number(f64),
    List(Vec<String>),
}

impl PropertyValue {
    /// Coerce a raw JSON value to the given data type
    ///
    /// Strings are accepted for every type, since configuration UIs commonly
    /// store everything as text. Lists also accept comma-separated strings.
    pub fn coerce(data_type: DataType, raw: &JsonValue) -> std::result::Result<Self, String> {
        match (data_type, raw) {
            (_, JsonValue::Null) => Err("value is null".to_string()),

            (DataType::String, JsonValue::String(s)) => Ok(Self::String(s.clone())),
            (DataType::String, JsonValue::Number(n)) => Ok(Self::String(n.to_string())),
            (DataType::String, JsonValue::Bool(b)) => Ok(Self::String(b.to_string())),

            (DataType::Password, JsonValue::String(s)) => Ok(Self::Password(s.clone())),
            (DataType::Password, JsonValue::Number(n)) => Ok(Self::Password(n.to_string())),

            (DataType::Boolean, JsonValue::Bool(b)) => Ok(Self::Boolean(*b)),
            (DataType::Boolean, JsonValue::String(s)) => match s.trim().to_ascii_lowercase().as_str()
            {
                "true" => Ok(Self::Boolean(true)),
                "false" => Ok(Self::Boolean(false)),
                _ => Err(format!("'{s}' is not a boolean")),
            },

            (DataType::Number, JsonValue::Number(n)) => n
                .as_f64()
                .map(Self::Number)
                .ok_or_else(|| format!("'{n}' is not representable as a number")),
            (DataType::Number, JsonValue::String(s)) => match s.trim().parse::<f64>() {
                Ok(n) if n.is_finite() => Ok(Self::Number(n)),
                _ => Err(format!("'{s}' is not a number")),
            },

            (DataType::List, JsonValue::Array(items)) => items
                .iter()
                .map(|item| match item {
                    JsonValue::String(s) => Ok(s.clone()),
                    JsonValue::Number(n) => Ok(n.to_string()),
                    JsonValue::Bool(b) => Ok(b.to_string()),
                    other => Err(format!("list item {other} is not a primitive")),
                })
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(Self::List),
            (DataType::List, JsonValue::String(s)) => Ok(Self::List(
                s.split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(String::from)
                    .collect(),
            )),

            (data_type, other) => Err(format!("{other} is not a valid {data_type} value")),
        }
    }

    /// Declared type of this value
    pub fn data_type(&self) -> DataType {
        match self {
            Self::String(_) => DataType::String,
            Self::Password(_) => DataType::Password,
            Self::Boolean(_) => DataType::Boolean,
            Self::Number(_) => DataType::Number,
            Self::List(_) => DataType::List,
        }
    }

    /// String value (not passwords)
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Secret value of a password property
    pub fn expose_secret(&self) -> Option<&str> {
        match self {
            Self::Password(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Unredacted string form, used for pattern validation
    pub(crate) fn to_plain_string(&self) -> String {
        match self {
            Self::String(s) | Self::Password(s) => s.clone(),
            Self::Boolean(b) => b.to_string(),
            Self::Number(n) => format_number(*n),
            Self::List(items) => items.join(","),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl fmt::Debug for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.debug_tuple("String").field(s).finish(),
            Self::Password(_) => f.write_str("Password(\"********\")"),
            Self::Boolean(b) => f.debug_tuple("Boolean").field(b).finish(),
            Self::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Self::List(items) => f.debug_tuple("List").field(items).finish(),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Password(_) => f.write_str("********"),
            other => f.write_str(&other.to_plain_string()),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<f64> for PropertyValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<Vec<String>> for PropertyValue {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

/// A named, read-only set of properties
///
/// Built once by a property source and handed to constructors by value.
/// There is no way to change a set after it has been built.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertySet {
    name: String,
    values: BTreeMap<String, PropertyValue>,
}

impl PropertySet {
    /// Create an empty set
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: BTreeMap::new(),
        }
    }

    /// Create a set from existing values
    pub fn from_values(name: impl Into<String>, values: BTreeMap<String, PropertyValue>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Add a value while building the set
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Set name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get a value by key
    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.values.get(key)
    }

    /// Get a value that must be present
    pub fn require(&self, key: &str) -> Result<&PropertyValue> {
        self.values.get(key).ok_or_else(|| {
            Error::invalid_property(key, format!("missing from property set '{}'", self.name))
        })
    }

    /// Get a string value
    ///
    /// Passwords are returned as well; callers asking for a string by key
    /// already know what they are reading.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.values.get(key)? {
            PropertyValue::String(s) | PropertyValue::Password(s) => Some(s),
            _ => None,
        }
    }

    /// Get a boolean value
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.values.get(key).and_then(PropertyValue::as_bool)
    }

    /// Get a numeric value
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.values.get(key).and_then(PropertyValue::as_f64)
    }

    /// Get a list value
    pub fn get_list(&self, key: &str) -> Option<&[String]> {
        self.values.get(key).and_then(PropertyValue::as_list)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Keys in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
