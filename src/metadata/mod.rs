//! Connector metadata module
//!
//! In-memory description of what a connector artifact declares: the
//! operations a connector supports, the managed components it depends on and
//! how each one is constructed.
//!
//! # Overview
//!
//! - `Capability` / `CapabilitySet` - Supported operations as a bitset
//! - `Constructor` - Parameter declarations plus a factory function
//! - `ManagedComponent` / `ComponentCatalog` - Injectable component types
//! - `ConnectorRegistration` / `ConnectorDescriptor` - A connector before and
//!   after discovery

mod registry;
mod types;

pub use registry::{
    ComponentCatalog, ComponentDescriptor, ComponentInstance, ConnectorDescriptor,
    ConnectorRegistration, Constructor, ConstructorBuilder, Factory, ManagedComponent,
    TypedComponent,
};
pub use types::{
    Capability, CapabilitySet, ComponentKey, Dependency, Parameter, PropertyRequest,
};
