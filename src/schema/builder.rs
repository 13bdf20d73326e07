//! Schema authoring
//!
//! Validates entity declarations and builds a `SchemaDefinition`. Rules run in
//! a fixed order for each entity, and the first violation fails the whole
//! build.

use super::types::{
    AttributeDefinition, EntityDeclaration, EntityDefinition, SchemaAuthoringError,
    SchemaDefinition, SchemaRule,
};
use crate::error::Result;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

/// Build a schema from the types found in a connector artifact
///
/// Types not marked as entities are skipped. Building the same declarations
/// twice yields equal schemas.
pub fn build_schema(
    declarations: &[EntityDeclaration],
) -> std::result::Result<SchemaDefinition, SchemaAuthoringError> {
    let mut entities = Vec::new();
    let mut entity_names = HashSet::new();

    for declaration in declarations {
        if !declaration.marked {
            debug!(
                entity = %declaration.name,
                extends = ?declaration.extends,
                "Skipping type not marked as an entity"
            );
            continue;
        }
        let entity = build_entity(declaration, &mut entity_names)?;
        entities.push(entity);
    }

    info!(entities = entities.len(), "Built schema");
    Ok(SchemaDefinition { entities })
}

fn build_entity(
    declaration: &EntityDeclaration,
    entity_names: &mut HashSet<String>,
) -> std::result::Result<EntityDefinition, SchemaAuthoringError> {
    let name = declaration.name.as_str();

    // (1) concrete, top-level, constructible
    let shape = declaration.shape;
    if shape.is_abstract {
        return Err(SchemaAuthoringError::entity(
            name,
            SchemaRule::Constructible,
            "entity type is abstract",
        ));
    }
    if shape.is_nested {
        return Err(SchemaAuthoringError::entity(
            name,
            SchemaRule::Constructible,
            "entity type is not top-level",
        ));
    }
    if shape.requires_state {
        return Err(SchemaAuthoringError::entity(
            name,
            SchemaRule::Constructible,
            "entity type cannot be constructed without external state",
        ));
    }

    // (2) at least one attribute
    if declaration.attributes.is_empty() {
        return Err(SchemaAuthoringError::entity(
            name,
            SchemaRule::HasAttributes,
            "entity declares no attributes",
        ));
    }

    // (3) exactly one naming attribute
    let naming: Vec<&str> = declaration
        .attributes
        .iter()
        .filter(|a| a.naming)
        .map(|a| a.name.as_str())
        .collect();
    if naming.len() != 1 {
        let message = if naming.is_empty() {
            "entity has no naming attribute".to_string()
        } else {
            format!(
                "entity has {} naming attributes ({}), expected exactly one",
                naming.len(),
                naming.join(", ")
            )
        };
        return Err(SchemaAuthoringError::entity(
            name,
            SchemaRule::NamingAttribute,
            message,
        ));
    }

    // (4) unique names
    if name.trim().is_empty() {
        return Err(SchemaAuthoringError::entity(
            name,
            SchemaRule::UniqueNames,
            "entity name is empty",
        ));
    }
    if !entity_names.insert(name.to_lowercase()) {
        return Err(SchemaAuthoringError::entity(
            name,
            SchemaRule::UniqueNames,
            "another entity has the same name",
        ));
    }
    let mut attribute_names = HashSet::new();
    for attribute in &declaration.attributes {
        if attribute.name.trim().is_empty() {
            return Err(SchemaAuthoringError::attribute(
                name,
                &attribute.name,
                SchemaRule::UniqueNames,
                "attribute name is empty",
            ));
        }
        if !attribute_names.insert(attribute.name.to_lowercase()) {
            return Err(SchemaAuthoringError::attribute(
                name,
                &attribute.name,
                SchemaRule::UniqueNames,
                "attribute is declared more than once",
            ));
        }
    }

    // (5) supported types
    if let Some(attribute) = declaration
        .attributes
        .iter()
        .find(|a| !a.type_ref.is_supported())
    {
        return Err(SchemaAuthoringError::attribute(
            name,
            &attribute.name,
            SchemaRule::SupportedType,
            format!("type '{}' is not supported", attribute.type_ref),
        ));
    }

    let attributes: Vec<AttributeDefinition> = declaration
        .attributes
        .iter()
        .map(|a| AttributeDefinition {
            name: a.name.clone(),
            type_ref: a.type_ref.clone(),
            nullable: a.nullable && !a.naming,
            naming: a.naming,
            display_name: a.display_name.clone(),
            tags: a.tags.clone(),
        })
        .collect();
    let naming_index = attributes.iter().position(|a| a.naming).unwrap_or(0);

    debug!(entity = %name, attributes = attributes.len(), "Validated entity");
    Ok(EntityDefinition {
        name: name.to_string(),
        attributes,
        naming_index,
    })
}

// ============================================================================
// Loading
// ============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum EntityDocument {
    Wrapped { entities: Vec<EntityDeclaration> },
    List(Vec<EntityDeclaration>),
}

/// Parse entity declarations from YAML
///
/// Accepts either a list of entities or a mapping with an `entities` list.
pub fn load_entities_from_str(yaml: &str) -> Result<Vec<EntityDeclaration>> {
    let document: EntityDocument = serde_yaml::from_str(yaml)?;
    Ok(match document {
        EntityDocument::Wrapped { entities } | EntityDocument::List(entities) => entities,
    })
}

/// Load entity declarations from a YAML file
pub fn load_entities_from_file(path: impl AsRef<Path>) -> Result<Vec<EntityDeclaration>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(crate::error::Error::FileNotFound {
            path: path.display().to_string(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    load_entities_from_str(&content)
}
