//! Injection resolver module
//!
//! Turns a connector descriptor into a constructed connector by resolving its
//! constructor dependencies: property sets from a `PropertySource`, managed
//! components from the artifact's `ComponentCatalog`.
//!
//! ```text
//! ConnectorDescriptor
//!   ├── property set 'customDatasourceProperties'  ──► PropertySource
//!   └── component DirectoryClient                  ──► ComponentCatalog
//!         └── property set 'customDatasourceProperties'
//! ```
//!
//! Construction happens once per deployment. A component referenced twice is
//! built once and shared.

mod resolver;
mod types;

pub use resolver::InjectionResolver;
pub use types::{Deployment, InjectedArgs, ResolvedValue};
