//! Property source module
//!
//! Resolves named, read-only property sets on demand.
//!
//! # Overview
//!
//! The properties module provides:
//! - `PropertySet` / `PropertyValue` - Typed, immutable key/value bundles
//! - `PropertySource` - The lookup seam the injection resolver calls
//! - `StaticPropertySource` - Fixed in-memory sets
//! - `DatasourcePropertySource` - Sets derived from a configuration descriptor
//!   and the values a datasource was configured with

mod provider;
mod types;

pub use provider::{DatasourcePropertySource, PropertySource, StaticPropertySource};
pub use types::{PropertySet, PropertyValue};

/// Well-known property set names
pub mod names {
    /// Custom properties configured on the datasource using the connector
    pub const CUSTOM_DATASOURCE_PROPERTIES: &str = "customDatasourceProperties";

    /// Naming (primary key) attribute of every schema entity
    pub const PRIMARY_KEY_ATTRIBUTES: &str = "primaryKeyAttributes";

    /// Schema objects the datasource targets
    pub const TARGET_SCHEMA_OBJECTS: &str = "targetSchemaObjects";

    /// Attribute catalog of every schema entity
    pub const SCHEMA_CATALOG: &str = "schemaCatalog";
}
