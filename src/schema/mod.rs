//! Schema authoring module
//!
//! Builds a validated directory schema from the entity types a connector
//! artifact declares.
//!
//! # Rules
//!
//! Checked per entity, in this order:
//!
//! 1. Concrete, top-level, constructible without external state
//! 2. At least one attribute
//! 3. Exactly one naming attribute
//! 4. Entity names unique in the schema, attribute names unique in the entity
//! 5. Every attribute type supported
//!
//! Any violation fails the build; there is no partial schema.

mod builder;
mod mapping;
mod types;

pub use builder::{build_schema, load_entities_from_file, load_entities_from_str};
pub use types::{
    AttributeDeclaration, AttributeDefinition, EntityDeclaration, EntityDefinition, EntityShape,
    SchemaAuthoringError, SchemaDefinition, SchemaRule, TypeRef,
};

#[cfg(test)]
mod tests;
