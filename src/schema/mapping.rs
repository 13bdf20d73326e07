//! Mapping built schemas onto entries and property sets

use super::types::{AttributeDefinition, EntityDefinition, SchemaDefinition, TypeRef};
use crate::error::{Error, Result};
use crate::ldap::{Dn, Entry, EntryValue, Rdn};
use crate::properties::names::{PRIMARY_KEY_ATTRIBUTES, SCHEMA_CATALOG};
use crate::properties::{PropertySet, PropertyValue};
use crate::types::JsonValue;

impl EntityDefinition {
    /// Map an entity instance to a directory entry below `parent`
    ///
    /// The naming attribute's value becomes the leftmost RDN. Every non-null
    /// attribute becomes an entry attribute, lists become multi-valued.
    /// Fields the entity does not declare are ignored.
    pub fn to_entry(&self, instance: &JsonValue, parent: &Dn) -> Result<Entry> {
        let object = instance
            .as_object()
            .ok_or_else(|| Error::mapping(&self.name, "instance is not an object"))?;

        let naming = self.naming_attribute();
        let naming_value = match lookup(object, &naming.name) {
            Some(value) if !value.is_null() => self.convert(naming, value)?,
            _ => {
                return Err(Error::mapping(
                    &self.name,
                    format!("naming attribute '{}' has no value", naming.name),
                ))
            }
        };
        let rdn_value = match naming_value.as_slice() {
            [single] => single.to_string(),
            _ => {
                return Err(Error::mapping(
                    &self.name,
                    format!("naming attribute '{}' must have exactly one value", naming.name),
                ))
            }
        };

        let mut entry = Entry::new(parent.child(Rdn::new(&naming.name, rdn_value)));
        for attribute in &self.attributes {
            let value = lookup(object, &attribute.name).filter(|v| !v.is_null());
            match value {
                Some(value) => {
                    let values = self.convert(attribute, value)?;
                    if !values.is_empty() {
                        entry.add_values(&attribute.name, values);
                    }
                }
                None if !attribute.nullable => {
                    return Err(Error::mapping(
                        &self.name,
                        format!("attribute '{}' is not nullable", attribute.name),
                    ))
                }
                None => {}
            }
        }
        Ok(entry)
    }

    fn convert(&self, attribute: &AttributeDefinition, value: &JsonValue) -> Result<Vec<EntryValue>> {
        match (&attribute.type_ref, value) {
            (TypeRef::List(element), JsonValue::Array(items)) => items
                .iter()
                .map(|item| self.primitive(attribute, element, item))
                .collect(),
            (TypeRef::List(_), _) => Err(Error::mapping(
                &self.name,
                format!("attribute '{}' expects a list", attribute.name),
            )),
            (type_ref, value) => Ok(vec![self.primitive(attribute, type_ref, value)?]),
        }
    }

    fn primitive(&self, attribute: &AttributeDefinition, type_ref: &TypeRef, value: &JsonValue) -> Result<EntryValue> {
        let converted = match (type_ref, value) {
            (TypeRef::String | TypeRef::Password, JsonValue::String(s)) => Some(EntryValue::String(s.clone())),
            (TypeRef::Boolean, JsonValue::Bool(b)) => Some(EntryValue::Boolean(*b)),
            (TypeRef::Number, JsonValue::Number(n)) => n.as_f64().map(EntryValue::Number),
            (TypeRef::Integer, JsonValue::Number(n)) => n
                .as_i64()
                .map(EntryValue::from)
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(EntryValue::Number)),
            _ => None,
        };
        converted.ok_or_else(|| {
            Error::mapping(
                &self.name,
                format!(
                    "attribute '{}' expects {type_ref}, got {value}",
                    attribute.name
                ),
            )
        })
    }
}

fn lookup<'a>(object: &'a serde_json::Map<String, JsonValue>, name: &str) -> Option<&'a JsonValue> {
    object.get(name).or_else(|| {
        object
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    })
}

impl SchemaDefinition {
    /// Publish the schema as property sets
    ///
    /// Returns the `schemaCatalog` set (entity name to attribute names) and the
    /// `primaryKeyAttributes` set (entity name to naming attribute).
    pub fn to_property_sets(&self) -> Vec<PropertySet> {
        let mut catalog = PropertySet::new(SCHEMA_CATALOG);
        let mut primary_keys = PropertySet::new(PRIMARY_KEY_ATTRIBUTES);
        for entity in &self.entities {
            let attributes: Vec<String> = entity.attributes.iter().map(|a| a.name.clone()).collect();
            catalog = catalog.with(entity.name.clone(), PropertyValue::List(attributes));
            primary_keys = primary_keys.with(
                entity.name.clone(),
                PropertyValue::String(entity.naming_attribute().name.clone()),
            );
        }
        vec![catalog, primary_keys]
    }

    /// JSON form of the schema
    pub fn to_json(&self) -> Result<JsonValue> {
        Ok(serde_json::to_value(self)?)
    }
}
