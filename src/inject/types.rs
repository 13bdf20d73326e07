//! Injected argument types

use crate::connector::Connector;
use crate::metadata::{CapabilitySet, ComponentInstance, ConnectorDescriptor};
use crate::properties::PropertySet;
use anyhow::{anyhow, bail};
use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

/// A resolved constructor argument
#[derive(Clone)]
pub enum ResolvedValue {
    Properties(PropertySet),
    Component(ComponentInstance),
}

impl fmt::Debug for ResolvedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedValue::Properties(set) => f.debug_tuple("Properties").field(set).finish(),
            ResolvedValue::Component(_) => f.write_str("Component(..)"),
        }
    }
}

/// Arguments handed to a constructor's factory, in declaration order
#[derive(Debug, Clone)]
pub struct InjectedArgs {
    owner: String,
    values: Vec<ResolvedValue>,
}

impl InjectedArgs {
    pub(crate) fn new(owner: impl Into<String>, values: Vec<ResolvedValue>) -> Self {
        Self {
            owner: owner.into(),
            values,
        }
    }

    /// Name of the component or connector being constructed
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Property set injected at position `index`
    pub fn properties(&self, index: usize) -> anyhow::Result<&PropertySet> {
        match self.values.get(index) {
            Some(ResolvedValue::Properties(set)) => Ok(set),
            Some(ResolvedValue::Component(_)) => bail!(
                "argument {index} of {} is a component, not a property set",
                self.owner
            ),
            None => bail!("{} has no argument {index}", self.owner),
        }
    }

    /// Managed component injected at position `index`
    pub fn component<T: Any + Send + Sync>(&self, index: usize) -> anyhow::Result<Arc<T>> {
        match self.values.get(index) {
            Some(ResolvedValue::Component(instance)) => {
                Arc::clone(instance).downcast::<T>().map_err(|_| {
                    anyhow!(
                        "argument {index} of {} is not a {}",
                        self.owner,
                        type_name::<T>()
                    )
                })
            }
            Some(ResolvedValue::Properties(set)) => bail!(
                "argument {index} of {} is property set '{}', not a component",
                self.owner,
                set.name()
            ),
            None => bail!("{} has no argument {index}", self.owner),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A fully constructed connector, ready to serve requests
#[derive(Clone)]
pub struct Deployment {
    pub(crate) descriptor: Arc<ConnectorDescriptor>,
    pub(crate) connector: Arc<dyn Connector>,
    pub(crate) components_built: usize,
}

impl Deployment {
    pub fn descriptor(&self) -> &ConnectorDescriptor {
        &self.descriptor
    }

    pub fn connector(&self) -> &Arc<dyn Connector> {
        &self.connector
    }

    /// Operations this deployment routes to its connector
    pub fn capabilities(&self) -> CapabilitySet {
        self.descriptor.capabilities()
    }

    /// Number of managed components constructed for this deployment
    pub fn components_built(&self) -> usize {
        self.components_built
    }
}

impl fmt::Debug for Deployment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deployment")
            .field("connector", &self.descriptor.name())
            .field("capabilities", &self.capabilities())
            .field("components_built", &self.components_built)
            .finish_non_exhaustive()
    }
}
