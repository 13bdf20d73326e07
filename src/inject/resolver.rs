//! Injection resolver implementation

use super::types::{Deployment, InjectedArgs, ResolvedValue};
use crate::error::{Error, Result};
use crate::metadata::{
    CapabilitySet, ComponentCatalog, ComponentInstance, ComponentKey, ConnectorDescriptor,
    Dependency, PropertyRequest,
};
use crate::properties::{PropertySet, PropertySource};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Builds connector instances from their descriptors
///
/// Holds the component catalog of a connector artifact and the property source
/// of one datasource. Cloning is cheap.
#[derive(Clone)]
pub struct InjectionResolver {
    catalog: Arc<ComponentCatalog>,
    source: Arc<dyn PropertySource>,
}

impl InjectionResolver {
    pub fn new(catalog: Arc<ComponentCatalog>, source: Arc<dyn PropertySource>) -> Self {
        Self { catalog, source }
    }

    /// Construct the connector and everything it depends on
    ///
    /// Managed components are built depth-first in declaration order and
    /// shared within this deployment. Nothing is kept on failure.
    pub fn deploy(&self, descriptor: Arc<ConnectorDescriptor>) -> Result<Deployment> {
        let name = descriptor.name().to_string();
        debug!(connector = %name, "Deploying connector");

        let mut resolution = Resolution {
            resolver: self,
            built: HashMap::new(),
            stack: Vec::new(),
            path: vec![name.clone()],
        };
        let args = resolution.resolve_args(&name, descriptor.dependencies())?;
        let connector = descriptor
            .construct(&args)
            .map_err(|e| Error::unresolvable(&name, format!("construction failed: {e:#}")))?;

        let declared = descriptor.capabilities();
        let implemented = CapabilitySet::probe(connector.as_ref());
        if let Some(missing) = declared.difference(implemented).iter().next() {
            return Err(Error::capability_mismatch(&name, missing));
        }
        let undeclared = implemented.difference(declared);
        if !undeclared.is_empty() {
            warn!(
                connector = %name,
                undeclared = %undeclared,
                "Connector implements operations it does not declare; they will not be routed"
            );
        }

        let components_built = resolution.built.len();
        info!(
            connector = %name,
            capabilities = %declared,
            components = components_built,
            "Deployed connector"
        );
        Ok(Deployment {
            descriptor,
            connector,
            components_built,
        })
    }

    /// Deploy independent datasources concurrently
    ///
    /// Each deployment is constructed on its own blocking task. Results come
    /// back in input order.
    pub async fn deploy_all<I>(deployments: I) -> Vec<Result<Deployment>>
    where
        I: IntoIterator<Item = (InjectionResolver, Arc<ConnectorDescriptor>)>,
    {
        let tasks = deployments.into_iter().map(|(resolver, descriptor)| {
            let name = descriptor.name().to_string();
            async move {
                tokio::task::spawn_blocking(move || resolver.deploy(descriptor))
                    .await
                    .unwrap_or_else(|e| {
                        Err(Error::Other(format!(
                            "Deployment of '{name}' did not complete: {e}"
                        )))
                    })
            }
        });
        join_all(tasks).await
    }

    fn property_set(&self, owner: &str, request: &PropertyRequest) -> Result<PropertySet> {
        let set = self
            .source
            .property_set(&request.set)
            .map_err(|e| {
                Error::unresolvable(owner, format!("property set '{}': {e}", request.set))
            })?
            .ok_or_else(|| {
                Error::unresolvable(owner, format!("unknown property set '{}'", request.set))
            })?;

        if let Some(key) = request.required_keys.iter().find(|k| !set.contains_key(k)) {
            return Err(Error::unresolvable(
                owner,
                format!("property set '{}' has no '{key}'", request.set),
            ));
        }
        Ok(set)
    }
}

/// State of one deployment's construction
struct Resolution<'a> {
    resolver: &'a InjectionResolver,
    built: HashMap<ComponentKey, ComponentInstance>,
    stack: Vec<ComponentKey>,
    path: Vec<String>,
}

impl Resolution<'_> {
    fn resolve_args(&mut self, owner: &str, dependencies: &[Dependency]) -> Result<InjectedArgs> {
        let mut values = Vec::with_capacity(dependencies.len());
        for dependency in dependencies {
            let value = match dependency {
                Dependency::Property(request) => {
                    ResolvedValue::Properties(self.resolver.property_set(owner, request)?)
                }
                Dependency::Component(key) => {
                    ResolvedValue::Component(self.resolve_component(owner, *key)?)
                }
            };
            values.push(value);
        }
        Ok(InjectedArgs::new(owner, values))
    }

    fn resolve_component(&mut self, owner: &str, key: ComponentKey) -> Result<ComponentInstance> {
        if let Some(instance) = self.built.get(&key) {
            return Ok(Arc::clone(instance));
        }
        if self.stack.contains(&key) {
            let mut path = self.path.clone();
            path.push(key.short_name().to_string());
            let start = path
                .iter()
                .position(|p| p == key.short_name())
                .unwrap_or(0);
            return Err(Error::CyclicDependency {
                path: path[start..].to_vec(),
            });
        }

        let component = self.resolver.catalog.get(&key).cloned().ok_or_else(|| {
            Error::unresolvable(owner, format!("component {key} is not a registered managed component"))
        })?;

        self.stack.push(key);
        self.path.push(key.short_name().to_string());
        let args = self.resolve_args(key.short_name(), component.dependencies())?;
        self.path.pop();
        self.stack.pop();

        let instance = component.construct(&args).map_err(|e| {
            Error::unresolvable(key.short_name(), format!("construction failed: {e:#}"))
        })?;
        debug!(component = %key, "Constructed managed component");
        self.built.insert(key, Arc::clone(&instance));
        Ok(instance)
    }
}
