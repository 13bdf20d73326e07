//! Component catalog and connector descriptors
//!
//! Registration replaces annotation scanning: a connector artifact registers
//! each managed component and its connector explicitly, declaring constructor
//! parameters as data. Discovery rules are checked at registration, graph
//! rules (missing components, cycles) when a connector is loaded.

use super::types::{Capability, CapabilitySet, ComponentKey, Dependency, Parameter, PropertyRequest};
use crate::config::ConfigurationDescriptor;
use crate::connector::Connector;
use crate::error::{Error, Result};
use crate::inject::InjectedArgs;
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A type-erased managed component instance
pub type ComponentInstance = Arc<dyn Any + Send + Sync>;

/// Factory producing a value from injected arguments
pub type Factory<T> = Arc<dyn Fn(&InjectedArgs) -> anyhow::Result<T> + Send + Sync>;

// ============================================================================
// Constructor
// ============================================================================

/// A constructor declaration: parameters plus the function that builds the value
pub struct Constructor<T> {
    parameters: Vec<Parameter>,
    factory: Factory<T>,
}

impl Constructor<()> {
    /// Start declaring a constructor
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> ConstructorBuilder {
        ConstructorBuilder::default()
    }
}

impl<T> Constructor<T> {
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    fn map<U: 'static>(self, f: impl Fn(T) -> U + Send + Sync + 'static) -> Constructor<U>
    where
        T: 'static,
    {
        let factory = self.factory;
        Constructor {
            parameters: self.parameters,
            factory: Arc::new(move |args| factory(args).map(&f)),
        }
    }
}

/// Builder for constructor declarations
#[derive(Debug, Default)]
pub struct ConstructorBuilder {
    parameters: Vec<Parameter>,
}

impl ConstructorBuilder {
    /// Declare a property set parameter
    #[must_use]
    pub fn property(mut self, set: impl Into<String>) -> Self {
        self.parameters
            .push(Parameter::Property(PropertyRequest::new(set)));
        self
    }

    /// Declare a property set parameter whose set must contain `keys`
    #[must_use]
    pub fn property_with_keys<I, S>(mut self, set: impl Into<String>, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameters.push(Parameter::Property(PropertyRequest {
            set: set.into(),
            required_keys: keys.into_iter().map(Into::into).collect(),
        }));
        self
    }

    /// Declare a managed component parameter
    #[must_use]
    pub fn component<T: 'static>(mut self) -> Self {
        self.parameters
            .push(Parameter::Component(ComponentKey::of::<T>()));
        self
    }

    /// Declare a parameter with no injection metadata
    #[must_use]
    pub fn plain(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.parameters.push(Parameter::Plain {
            name: name.into(),
            type_name: type_name.into(),
        });
        self
    }

    /// Finish with the function that builds the value
    pub fn build<T, F>(self, factory: F) -> Constructor<T>
    where
        F: Fn(&InjectedArgs) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        Constructor {
            parameters: self.parameters,
            factory: Arc::new(factory),
        }
    }
}

/// Check the discovery rules for a set of constructors
///
/// Exactly one constructor, and every parameter must be injectable.
fn discover<T>(owner: &str, mut constructors: Vec<Constructor<T>>) -> Result<(Vec<Dependency>, Factory<T>)> {
    if constructors.len() != 1 {
        return Err(Error::unresolvable(
            owner,
            format!(
                "expected exactly one constructor, found {}",
                constructors.len()
            ),
        ));
    }
    let constructor = constructors.remove(0);

    let dependencies = constructor
        .parameters
        .iter()
        .map(|param| match param {
            Parameter::Property(req) => Ok(Dependency::Property(req.clone())),
            Parameter::Component(key) => Ok(Dependency::Component(*key)),
            Parameter::Plain { .. } => Err(Error::unresolvable(
                owner,
                format!("constructor takes a non-injectable {param}"),
            )),
        })
        .collect::<Result<Vec<_>>>()?;

    Ok((dependencies, constructor.factory))
}

// ============================================================================
// Managed Components
// ============================================================================

/// Registration of a managed component type
pub struct ManagedComponent {
    key: ComponentKey,
    constructors: Vec<Constructor<ComponentInstance>>,
}

impl ManagedComponent {
    /// Start registering the component type `T`
    pub fn of<T: Any + Send + Sync>() -> TypedComponent<T> {
        TypedComponent {
            constructors: Vec::new(),
        }
    }

    pub fn key(&self) -> ComponentKey {
        self.key
    }
}

/// Registration of a managed component, before type erasure
pub struct TypedComponent<T> {
    constructors: Vec<Constructor<T>>,
}

impl<T: Any + Send + Sync> TypedComponent<T> {
    /// Add a constructor
    #[must_use]
    pub fn constructor(mut self, constructor: Constructor<T>) -> Self {
        self.constructors.push(constructor);
        self
    }
}

impl<T: Any + Send + Sync> From<TypedComponent<T>> for ManagedComponent {
    fn from(typed: TypedComponent<T>) -> Self {
        Self {
            key: ComponentKey::of::<T>(),
            constructors: typed
                .constructors
                .into_iter()
                .map(|c| c.map(|value| Arc::new(value) as ComponentInstance))
                .collect(),
        }
    }
}

/// A managed component that passed discovery
pub struct ComponentDescriptor {
    key: ComponentKey,
    dependencies: Vec<Dependency>,
    factory: Factory<ComponentInstance>,
}

impl ComponentDescriptor {
    pub fn key(&self) -> ComponentKey {
        self.key
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    pub(crate) fn construct(&self, args: &InjectedArgs) -> anyhow::Result<ComponentInstance> {
        (self.factory)(args)
    }
}

impl fmt::Debug for ComponentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDescriptor")
            .field("key", &self.key)
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Connector Descriptors
// ============================================================================

/// Registration of a connector type
pub struct ConnectorRegistration {
    name: String,
    description: Option<String>,
    capabilities: CapabilitySet,
    configuration: Option<ConfigurationDescriptor>,
    constructors: Vec<Constructor<Arc<dyn Connector>>>,
}

impl ConnectorRegistration {
    /// Start registering a connector
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            capabilities: CapabilitySet::empty(),
            configuration: None,
            constructors: Vec::new(),
        }
    }

    /// Take name and description from a configuration descriptor
    pub fn from_configuration(configuration: ConfigurationDescriptor) -> Self {
        let mut registration = Self::new(configuration.name.clone());
        registration.description = configuration.description.clone();
        registration.configuration = Some(configuration);
        registration
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Declare support for an operation
    #[must_use]
    pub fn supports(mut self, capability: Capability) -> Self {
        self.capabilities = self.capabilities.with(capability);
        self
    }

    /// Declare support for several operations
    #[must_use]
    pub fn supports_all(mut self, capabilities: impl IntoIterator<Item = Capability>) -> Self {
        for capability in capabilities {
            self.capabilities = self.capabilities.with(capability);
        }
        self
    }

    /// Add a constructor for the connector type `C`
    #[must_use]
    pub fn constructor<C: Connector + 'static>(mut self, constructor: Constructor<C>) -> Self {
        self.constructors
            .push(constructor.map(|c| Arc::new(c) as Arc<dyn Connector>));
        self
    }

    /// Apply the discovery rules and produce an immutable descriptor
    pub fn describe(self) -> Result<ConnectorDescriptor> {
        if self.name.trim().is_empty() {
            return Err(Error::config("Connector name cannot be empty"));
        }
        let (dependencies, factory) = discover(&self.name, self.constructors)?;
        Ok(ConnectorDescriptor {
            name: self.name,
            description: self.description,
            capabilities: self.capabilities,
            configuration: self.configuration,
            dependencies,
            factory,
        })
    }
}

/// Immutable description of a loaded connector
pub struct ConnectorDescriptor {
    name: String,
    description: Option<String>,
    capabilities: CapabilitySet,
    configuration: Option<ConfigurationDescriptor>,
    dependencies: Vec<Dependency>,
    factory: Factory<Arc<dyn Connector>>,
}

impl ConnectorDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Declared capabilities
    pub fn capabilities(&self) -> CapabilitySet {
        self.capabilities
    }

    pub fn configuration(&self) -> Option<&ConfigurationDescriptor> {
        self.configuration.as_ref()
    }

    /// Constructor dependencies, in declaration order
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    pub(crate) fn construct(&self, args: &InjectedArgs) -> anyhow::Result<Arc<dyn Connector>> {
        (self.factory)(args)
    }
}

impl fmt::Debug for ConnectorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectorDescriptor")
            .field("name", &self.name)
            .field("capabilities", &self.capabilities)
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// All managed components registered by a connector artifact
#[derive(Debug, Default)]
pub struct ComponentCatalog {
    components: HashMap<ComponentKey, Arc<ComponentDescriptor>>,
}

impl ComponentCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a managed component, applying the discovery rules
    pub fn register(&mut self, component: impl Into<ManagedComponent>) -> Result<()> {
        let component = component.into();
        let key = component.key;
        if self.components.contains_key(&key) {
            return Err(Error::config(format!(
                "Managed component {key} is registered twice"
            )));
        }

        let (dependencies, factory) = discover(key.short_name(), component.constructors)?;
        debug!(component = %key, dependencies = dependencies.len(), "Registered managed component");
        self.components.insert(
            key,
            Arc::new(ComponentDescriptor {
                key,
                dependencies,
                factory,
            }),
        );
        Ok(())
    }

    /// Register a component, builder style
    pub fn with(mut self, component: impl Into<ManagedComponent>) -> Result<Self> {
        self.register(component)?;
        Ok(self)
    }

    pub fn get(&self, key: &ComponentKey) -> Option<&Arc<ComponentDescriptor>> {
        self.components.get(key)
    }

    pub fn contains(&self, key: &ComponentKey) -> bool {
        self.components.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Describe a connector and check its dependency graph against this catalog
    ///
    /// Fails with `UnresolvableDependency` if a referenced component is not
    /// registered and with `CyclicDependency` if the graph has a cycle.
    pub fn load_connector(&self, registration: ConnectorRegistration) -> Result<ConnectorDescriptor> {
        let descriptor = registration.describe()?;

        let mut finished = HashSet::new();
        let mut path = vec![descriptor.name.clone()];
        let mut stack = Vec::new();
        self.check_dependencies(
            &descriptor.name,
            &descriptor.dependencies,
            &mut stack,
            &mut path,
            &mut finished,
        )?;

        debug!(
            connector = %descriptor.name,
            capabilities = %descriptor.capabilities,
            "Loaded connector descriptor"
        );
        Ok(descriptor)
    }

    fn check_dependencies(
        &self,
        owner: &str,
        dependencies: &[Dependency],
        stack: &mut Vec<ComponentKey>,
        path: &mut Vec<String>,
        finished: &mut HashSet<ComponentKey>,
    ) -> Result<()> {
        for dependency in dependencies {
            let Dependency::Component(key) = dependency else {
                continue;
            };
            if finished.contains(key) {
                continue;
            }
            if stack.contains(key) {
                path.push(key.short_name().to_string());
                let start = path
                    .iter()
                    .position(|p| p == key.short_name())
                    .unwrap_or(0);
                return Err(Error::CyclicDependency {
                    path: path[start..].to_vec(),
                });
            }
            let component = self.components.get(key).ok_or_else(|| {
                Error::unresolvable(owner, format!("component {key} is not a registered managed component"))
            })?;

            stack.push(*key);
            path.push(key.short_name().to_string());
            self.check_dependencies(key.short_name(), &component.dependencies, stack, path, finished)?;
            path.pop();
            stack.pop();
            finished.insert(*key);
        }
        Ok(())
    }
}
