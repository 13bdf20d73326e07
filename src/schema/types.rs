//! Schema types

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Attribute Types
// ============================================================================

/// Declared type of an attribute
///
/// Written as `STRING`, `BOOLEAN`, `NUMBER`, `INTEGER`, `PASSWORD` or
/// `LIST<primitive>`. Anything else parses to `Unsupported` so that the
/// schema engine can report it against the attribute that declared it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TypeRef {
    String,
    Boolean,
    Number,
    Integer,
    Password,
    /// Multi-valued attribute
    List(Box<TypeRef>),
    Unsupported(String),
}

impl TypeRef {
    /// A list of the given element type
    pub fn list(element: TypeRef) -> Self {
        TypeRef::List(Box::new(element))
    }

    fn is_primitive(&self) -> bool {
        matches!(
            self,
            TypeRef::String | TypeRef::Boolean | TypeRef::Number | TypeRef::Integer | TypeRef::Password
        )
    }

    /// Whether the schema engine accepts this type
    pub fn is_supported(&self) -> bool {
        match self {
            TypeRef::List(element) => element.is_primitive(),
            other => other.is_primitive(),
        }
    }

    pub fn is_multi_valued(&self) -> bool {
        matches!(self, TypeRef::List(_))
    }
}

impl From<String> for TypeRef {
    fn from(text: String) -> Self {
        let trimmed = text.trim();
        let upper = trimmed.to_ascii_uppercase();
        match upper.as_str() {
            "STRING" => TypeRef::String,
            "BOOLEAN" => TypeRef::Boolean,
            "NUMBER" => TypeRef::Number,
            "INTEGER" => TypeRef::Integer,
            "PASSWORD" => TypeRef::Password,
            _ => match upper
                .strip_prefix("LIST<")
                .and_then(|rest| rest.strip_suffix('>'))
            {
                Some(_) => {
                    let inner = &trimmed[5..trimmed.len() - 1];
                    TypeRef::list(TypeRef::from(inner.to_string()))
                }
                None => TypeRef::Unsupported(trimmed.to_string()),
            },
        }
    }
}

impl From<&str> for TypeRef {
    fn from(text: &str) -> Self {
        TypeRef::from(text.to_string())
    }
}

impl From<TypeRef> for String {
    fn from(type_ref: TypeRef) -> Self {
        type_ref.to_string()
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::String => f.write_str("STRING"),
            TypeRef::Boolean => f.write_str("BOOLEAN"),
            TypeRef::Number => f.write_str("NUMBER"),
            TypeRef::Integer => f.write_str("INTEGER"),
            TypeRef::Password => f.write_str("PASSWORD"),
            TypeRef::List(element) => write!(f, "LIST<{element}>"),
            TypeRef::Unsupported(name) => f.write_str(name),
        }
    }
}

// ============================================================================
// Declarations
// ============================================================================

/// How a declared entity type can be instantiated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityShape {
    /// Cannot be instantiated directly
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    /// Declared inside another type
    #[serde(default, rename = "nested")]
    pub is_nested: bool,
    /// Needs state from an enclosing instance or another outside source
    #[serde(default)]
    pub requires_state: bool,
}

/// An attribute as declared on an entity type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeDeclaration {
    pub name: String,
    #[serde(rename = "type")]
    pub type_ref: TypeRef,
    #[serde(default = "default_true")]
    pub nullable: bool,
    #[serde(default, rename = "isNamingAttribute")]
    pub naming: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl AttributeDeclaration {
    pub fn new(name: impl Into<String>, type_ref: impl Into<TypeRef>) -> Self {
        Self {
            name: name.into(),
            type_ref: type_ref.into(),
            nullable: true,
            naming: false,
            display_name: None,
            tags: Vec::new(),
        }
    }

    /// Mark as the entity's naming attribute
    #[must_use]
    pub fn naming(mut self) -> Self {
        self.naming = true;
        self
    }

    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    #[must_use]
    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}

/// A type found in a connector artifact
///
/// Only types marked as entities become part of the schema. `extends` records
/// structural inheritance but carries nothing over: a subtype contributes
/// exactly the attributes it declares itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDeclaration {
    pub name: String,
    #[serde(default = "default_true", rename = "entity")]
    pub marked: bool,
    #[serde(flatten)]
    pub shape: EntityShape,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    #[serde(default)]
    pub attributes: Vec<AttributeDeclaration>,
}

impl EntityDeclaration {
    /// A type marked as a schema entity
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            marked: true,
            shape: EntityShape::default(),
            extends: None,
            attributes: Vec::new(),
        }
    }

    /// A type that is not itself marked as an entity
    pub fn unmarked(name: impl Into<String>) -> Self {
        Self {
            marked: false,
            ..Self::new(name)
        }
    }

    #[must_use]
    pub fn attribute(mut self, attribute: AttributeDeclaration) -> Self {
        self.attributes.push(attribute);
        self
    }

    #[must_use]
    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.extends = Some(parent.into());
        self
    }

    #[must_use]
    pub fn shape(mut self, shape: EntityShape) -> Self {
        self.shape = shape;
        self
    }
}

// ============================================================================
// Built Schema
// ============================================================================

/// A validated attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub type_ref: TypeRef,
    pub nullable: bool,
    #[serde(rename = "isNamingAttribute")]
    pub naming: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl AttributeDefinition {
    /// Display name, falling back to the attribute name
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

/// A validated entity: at least one attribute, exactly one naming attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityDefinition {
    pub(crate) name: String,
    pub(crate) attributes: Vec<AttributeDefinition>,
    #[serde(skip)]
    pub(crate) naming_index: usize,
}

impl EntityDefinition {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attributes in declaration order
    pub fn attributes(&self) -> &[AttributeDefinition] {
        &self.attributes
    }

    /// Look up an attribute, ignoring case
    pub fn attribute(&self, name: &str) -> Option<&AttributeDefinition> {
        self.attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
    }

    pub fn naming_attribute(&self) -> &AttributeDefinition {
        &self.attributes[self.naming_index]
    }
}

/// A validated schema
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaDefinition {
    pub(crate) entities: Vec<EntityDefinition>,
}

impl SchemaDefinition {
    /// Entities in declaration order
    pub fn entities(&self) -> &[EntityDefinition] {
        &self.entities
    }

    /// Look up an entity, ignoring case
    pub fn entity(&self, name: &str) -> Option<&EntityDefinition> {
        self.entities
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(name))
    }

    /// Naming attribute of an entity
    pub fn naming_attribute(&self, entity: &str) -> Option<&AttributeDefinition> {
        self.entity(entity).map(EntityDefinition::naming_attribute)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Validation rule a declaration broke, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaRule {
    /// Concrete, top-level and constructible without outside state
    Constructible,
    /// At least one attribute
    HasAttributes,
    /// Exactly one naming attribute
    NamingAttribute,
    /// Unique entity and attribute names
    UniqueNames,
    /// Supported attribute type
    SupportedType,
}

impl fmt::Display for SchemaRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SchemaRule::Constructible => "constructible",
            SchemaRule::HasAttributes => "has-attributes",
            SchemaRule::NamingAttribute => "naming-attribute",
            SchemaRule::UniqueNames => "unique-names",
            SchemaRule::SupportedType => "supported-type",
        };
        f.write_str(name)
    }
}

/// A declaration that failed validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "Schema authoring failed for entity '{entity}'{}: {message} [{rule}]",
    .attribute.as_ref().map(|a| format!(", attribute '{a}'")).unwrap_or_default()
)]
pub struct SchemaAuthoringError {
    pub entity: String,
    pub attribute: Option<String>,
    pub rule: SchemaRule,
    pub message: String,
}

impl SchemaAuthoringError {
    pub(crate) fn entity(entity: &str, rule: SchemaRule, message: impl Into<String>) -> Self {
        Self {
            entity: entity.to_string(),
            attribute: None,
            rule,
            message: message.into(),
        }
    }

    pub(crate) fn attribute(
        entity: &str,
        attribute: &str,
        rule: SchemaRule,
        message: impl Into<String>,
    ) -> Self {
        Self {
            entity: entity.to_string(),
            attribute: Some(attribute.to_string()),
            rule,
            message: message.into(),
        }
    }
}
