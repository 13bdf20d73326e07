//! Property source implementations

use super::names::CUSTOM_DATASOURCE_PROPERTIES;
use super::types::PropertySet;
use crate::config::ConfigurationDescriptor;
use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Resolves property sets by name
///
/// Implementations are expected to be cheap, local reads. Each call returns a
/// freshly built set; callers own it and nothing they do can affect the source.
pub trait PropertySource: Send + Sync {
    /// Resolve a named set, `None` when the name is unknown
    fn property_set(&self, name: &str) -> Result<Option<PropertySet>>;

    /// Names of the sets this source can resolve
    fn available_sets(&self) -> Vec<String>;
}

// ============================================================================
// Static Source
// ============================================================================

/// Property source backed by fixed, prebuilt sets
#[derive(Debug, Clone, Default)]
pub struct StaticPropertySource {
    sets: HashMap<String, PropertySet>,
}

impl StaticPropertySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a set, keyed by its name
    #[must_use]
    pub fn with_set(mut self, set: PropertySet) -> Self {
        self.sets.insert(set.name().to_string(), set);
        self
    }
}

impl PropertySource for StaticPropertySource {
    fn property_set(&self, name: &str) -> Result<Option<PropertySet>> {
        Ok(self.sets.get(name).cloned())
    }

    fn available_sets(&self) -> Vec<String> {
        let mut names: Vec<_> = self.sets.keys().cloned().collect();
        names.sort();
        names
    }
}

// ============================================================================
// Datasource Source
// ============================================================================

/// Property source for a configured datasource
///
/// Serves the custom datasource properties by validating the raw values the
/// datasource was configured with against the connector's configuration
/// descriptor. Other sets (schema catalog, primary keys) can be attached.
#[derive(Debug, Clone)]
pub struct DatasourcePropertySource {
    descriptor: ConfigurationDescriptor,
    values: JsonObject,
    extra: HashMap<String, PropertySet>,
}

impl DatasourcePropertySource {
    /// Create a source from a descriptor and raw values
    pub fn new(descriptor: ConfigurationDescriptor, values: JsonObject) -> Self {
        Self {
            descriptor,
            values,
            extra: HashMap::new(),
        }
    }

    /// Create a source from a JSON document that must be an object
    pub fn from_json(descriptor: ConfigurationDescriptor, values: JsonValue) -> Result<Self> {
        match values {
            JsonValue::Object(map) => Ok(Self::new(descriptor, map)),
            JsonValue::Null => Ok(Self::new(descriptor, JsonObject::new())),
            other => Err(Error::config(format!(
                "Datasource properties must be a JSON object, got {other}"
            ))),
        }
    }

    /// Attach an additional named set
    #[must_use]
    pub fn with_set(mut self, set: PropertySet) -> Self {
        self.extra.insert(set.name().to_string(), set);
        self
    }

    /// Attach several sets at once
    #[must_use]
    pub fn with_sets(mut self, sets: impl IntoIterator<Item = PropertySet>) -> Self {
        for set in sets {
            self.extra.insert(set.name().to_string(), set);
        }
        self
    }

    /// The descriptor this source validates against
    pub fn descriptor(&self) -> &ConfigurationDescriptor {
        &self.descriptor
    }

    fn build_custom_properties(&self) -> Result<PropertySet> {
        if let Some(unknown) = self
            .values
            .keys()
            .find(|key| self.descriptor.property(key).is_none())
        {
            return Err(Error::invalid_property(
                unknown,
                format!("not declared by connector '{}'", self.descriptor.name),
            ));
        }

        let mut values = BTreeMap::new();
        for decl in &self.descriptor.meta {
            let raw = self
                .values
                .get(&decl.name)
                .filter(|v| !v.is_null())
                .or(decl.default_value.as_ref());

            match raw {
                Some(raw) => {
                    values.insert(decl.name.clone(), decl.accept(raw)?);
                }
                None if decl.is_required => {
                    return Err(Error::invalid_property(
                        &decl.name,
                        "required property has no value",
                    ));
                }
                None => {}
            }
        }

        debug!(
            connector = %self.descriptor.name,
            properties = values.len(),
            "Resolved custom datasource properties"
        );
        Ok(PropertySet::from_values(CUSTOM_DATASOURCE_PROPERTIES, values))
    }
}

impl PropertySource for DatasourcePropertySource {
    fn property_set(&self, name: &str) -> Result<Option<PropertySet>> {
        if name == CUSTOM_DATASOURCE_PROPERTIES {
            return self.build_custom_properties().map(Some);
        }
        Ok(self.extra.get(name).cloned())
    }

    fn available_sets(&self) -> Vec<String> {
        let mut names: Vec<_> = self.extra.keys().cloned().collect();
        names.push(CUSTOM_DATASOURCE_PROPERTIES.to_string());
        names.sort();
        names
    }
}
