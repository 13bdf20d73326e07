//! Configuration types
//!
//! Two documents are read by the host:
//!
//! - the connector's configuration descriptor (`connector_configuration.json`),
//!   which declares the custom datasource properties a connector accepts
//! - the host configuration (YAML), which tunes the runtime itself

use crate::error::{Error, Result};
use crate::properties::PropertyValue;
use crate::types::DataType;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

// ============================================================================
// Configuration Descriptor
// ============================================================================

/// Connector configuration descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationDescriptor {
    /// Connector name
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: Option<String>,

    /// Declared custom datasource properties
    #[serde(default)]
    pub meta: Vec<PropertyDeclaration>,
}

/// A single property declaration in the `meta` list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDeclaration {
    /// Property key
    pub name: String,

    /// Property description
    #[serde(default)]
    pub description: Option<String>,

    /// UI section the property is displayed in
    #[serde(default)]
    pub section_name: Option<String>,

    /// Default value used when the datasource does not set one
    #[serde(default)]
    pub default_value: Option<serde_json::Value>,

    /// Declared data type
    #[serde(default)]
    pub data_type: DataType,

    /// Whether the property must have a value
    #[serde(default)]
    pub is_required: bool,

    /// Pattern the string form of the value must match
    #[serde(default)]
    pub regex: Option<String>,
}

impl PropertyDeclaration {
    /// Create a declaration with the given name and type
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            description: None,
            section_name: None,
            default_value: None,
            data_type,
            is_required: false,
            regex: None,
        }
    }

    /// Mark as required
    #[must_use]
    pub fn required(mut self) -> Self {
        self.is_required = true;
        self
    }

    /// Set the default value
    #[must_use]
    pub fn with_default(mut self, value: impl Into<serde_json::Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Set the validation pattern
    #[must_use]
    pub fn with_regex(mut self, regex: impl Into<String>) -> Self {
        self.regex = Some(regex.into());
        self
    }

    /// Compile the validation pattern, if any
    ///
    /// The pattern must match the whole value, so it is anchored here.
    pub fn compiled_regex(&self) -> Result<Option<Regex>> {
        match &self.regex {
            Some(pattern) if !pattern.is_empty() => {
                Ok(Some(Regex::new(&format!("^(?:{pattern})$"))?))
            }
            _ => Ok(None),
        }
    }

    /// Coerce a raw value to this declaration's type and validate it
    pub fn accept(&self, raw: &serde_json::Value) -> Result<PropertyValue> {
        let value = PropertyValue::coerce(self.data_type, raw)
            .map_err(|message| Error::invalid_property(&self.name, message))?;

        if let Some(regex) = self.compiled_regex()? {
            let candidates: Vec<String> = match &value {
                PropertyValue::List(items) => items.clone(),
                other => vec![other.to_plain_string()],
            };
            if let Some(bad) = candidates.iter().find(|c| !regex.is_match(c)) {
                let shown = if self.data_type == DataType::Password {
                    "********"
                } else {
                    bad.as_str()
                };
                return Err(Error::invalid_property(
                    &self.name,
                    format!("value '{shown}' does not match pattern '{}'", regex.as_str()),
                ));
            }
        }

        Ok(value)
    }
}

impl ConfigurationDescriptor {
    /// Load a descriptor from a JSON or YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                Error::config(format!(
                    "Failed to read configuration descriptor '{}': {e}",
                    path.display()
                ))
            }
        })?;

        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));

        if is_yaml {
            Self::from_yaml_str(&content)
        } else {
            Self::from_json_str(&content)
        }
    }

    /// Parse a descriptor from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        let descriptor: Self = serde_json::from_str(json)?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Parse a descriptor from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let descriptor: Self = serde_yaml::from_str(yaml)?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Validate the descriptor
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::config("Connector name cannot be empty"));
        }

        let mut seen = HashSet::new();
        for decl in &self.meta {
            if decl.name.trim().is_empty() {
                return Err(Error::config("Property name cannot be empty"));
            }
            if !seen.insert(decl.name.as_str()) {
                return Err(Error::config(format!(
                    "Duplicate property '{}' in configuration descriptor",
                    decl.name
                )));
            }

            decl.compiled_regex().map_err(|e| {
                Error::invalid_property(&decl.name, format!("invalid regex: {e}"))
            })?;

            if let Some(default) = &decl.default_value {
                decl.accept(default)?;
            }
        }

        Ok(())
    }

    /// Look up a property declaration by name
    pub fn property(&self, name: &str) -> Option<&PropertyDeclaration> {
        self.meta.iter().find(|d| d.name == name)
    }

    /// Names of all required properties
    pub fn required_properties(&self) -> Vec<&str> {
        self.meta
            .iter()
            .filter(|d| d.is_required)
            .map(|d| d.name.as_str())
            .collect()
    }
}

// ============================================================================
// Host Config
// ============================================================================

/// Runtime configuration of the connector host
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostConfig {
    /// Request dispatch settings
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

/// Dispatcher settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Upper bound on a single handler invocation
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    30_000
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl DispatchConfig {
    /// Handler timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl HostConfig {
    /// Load host configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read host config '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Parse host configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        if config.dispatch.timeout_ms == 0 {
            return Err(Error::config("dispatch.timeout_ms must be greater than zero"));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const PENNAVE: &str = r#"{
      "name": "PennAve Connector",
      "description": "Connects to the PennAve IAM server",
      "meta": [
        {"name": "host", "description": "Server host", "sectionName": "Connection",
         "dataType": "STRING", "isRequired": true, "regex": "[a-z.]+"},
        {"name": "username", "dataType": "STRING", "isRequired": true},
        {"name": "password", "dataType": "PASSWORD", "isRequired": true},
        {"name": "pageSize", "dataType": "NUMBER", "defaultValue": "100"},
        {"name": "objectClasses", "dataType": "LIST", "defaultValue": ["person"]}
      ]
    }"#;

    #[test]
    fn test_parse_descriptor() {
        let descriptor = ConfigurationDescriptor::from_json_str(PENNAVE).unwrap();
        assert_eq!(descriptor.name, "PennAve Connector");
        assert_eq!(descriptor.meta.len(), 5);

        let host = descriptor.property("host").unwrap();
        assert_eq!(host.section_name.as_deref(), Some("Connection"));
        assert!(host.is_required);
        assert_eq!(
            descriptor.required_properties(),
            vec!["host", "username", "password"]
        );
        assert_eq!(
            descriptor.property("password").unwrap().data_type,
            DataType::Password
        );
    }

    #[test]
    fn test_descriptor_rejects_duplicate_names() {
        let json = r#"{"name": "x", "meta": [{"name": "a"}, {"name": "a"}]}"#;
        let err = ConfigurationDescriptor::from_json_str(json).unwrap_err();
        assert!(err.to_string().contains("Duplicate property 'a'"));
    }

    #[test]
    fn test_descriptor_rejects_bad_default() {
        let json = r#"{"name": "x", "meta": [{"name": "n", "dataType": "NUMBER", "defaultValue": "ten"}]}"#;
        assert!(ConfigurationDescriptor::from_json_str(json).is_err());

        let json = r#"{"name": "x", "meta": [{"name": "h", "regex": "[0-9]+", "defaultValue": "abc"}]}"#;
        assert!(ConfigurationDescriptor::from_json_str(json).is_err());
    }

    #[test]
    fn test_descriptor_rejects_bad_regex() {
        let json = r#"{"name": "x", "meta": [{"name": "h", "regex": "([a-z"}]}"#;
        let err = ConfigurationDescriptor::from_json_str(json).unwrap_err();
        assert!(err.to_string().contains("invalid regex"));
    }

    #[test]
    fn test_descriptor_rejects_empty_name() {
        let json = r#"{"name": "  ", "meta": []}"#;
        assert!(ConfigurationDescriptor::from_json_str(json).is_err());
    }

    #[test]
    fn test_regex_is_anchored() {
        let decl = PropertyDeclaration::new("port", DataType::String).with_regex("[0-9]+");
        assert!(decl.accept(&serde_json::json!("389")).is_ok());
        assert!(decl.accept(&serde_json::json!("389x")).is_err());
    }

    #[test]
    fn test_descriptor_from_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "name: yaml-connector\nmeta:\n  - name: host\n    dataType: STRING\n    isRequired: true\n"
        )
        .unwrap();

        let descriptor = ConfigurationDescriptor::from_file(file.path()).unwrap();
        assert_eq!(descriptor.name, "yaml-connector");
        assert_eq!(descriptor.required_properties(), vec!["host"]);
    }

    #[test]
    fn test_descriptor_missing_file() {
        let err = ConfigurationDescriptor::from_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }

    #[test]
    fn test_host_config_defaults() {
        let config = HostConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config.dispatch.timeout_ms, 30_000);

        let config = HostConfig::from_yaml_str("dispatch:\n  timeout_ms: 250\n").unwrap();
        assert_eq!(config.dispatch.timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_host_config_rejects_zero_timeout() {
        assert!(HostConfig::from_yaml_str("dispatch:\n  timeout_ms: 0\n").is_err());
    }
}
