//! Metadata types
//!
//! Capabilities, component keys and constructor parameter declarations.

use crate::connector::Connector;
use crate::types::OperationKind;
use std::any::{type_name, TypeId};
use std::fmt;

// ============================================================================
// Capabilities
// ============================================================================

/// A protocol operation a connector can support
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Search,
    Create,
    Modify,
    Delete,
    Authenticate,
    TestConnection,
}

impl Capability {
    /// All capabilities, in declaration order
    pub const ALL: [Capability; 6] = [
        Capability::Search,
        Capability::Create,
        Capability::Modify,
        Capability::Delete,
        Capability::Authenticate,
        Capability::TestConnection,
    ];

    /// Capability required to serve an operation
    pub fn for_operation(kind: OperationKind) -> Self {
        match kind {
            OperationKind::Search => Capability::Search,
            OperationKind::Create => Capability::Create,
            OperationKind::Modify => Capability::Modify,
            OperationKind::Delete => Capability::Delete,
            OperationKind::Authenticate => Capability::Authenticate,
            OperationKind::TestConnection => Capability::TestConnection,
        }
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::Search => "Search",
            Capability::Create => "Create",
            Capability::Modify => "Modify",
            Capability::Delete => "Delete",
            Capability::Authenticate => "Authenticate",
            Capability::TestConnection => "TestConnection",
        };
        f.write_str(name)
    }
}

/// A set of capabilities, stored as a bitset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CapabilitySet(u8);

impl CapabilitySet {
    /// The empty set
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Every capability
    pub fn all() -> Self {
        Capability::ALL.into_iter().collect()
    }

    /// Capabilities an instance structurally satisfies
    pub fn probe(connector: &dyn Connector) -> Self {
        let mut set = Self::empty();
        if connector.as_search().is_some() {
            set = set.with(Capability::Search);
        }
        if connector.as_create().is_some() {
            set = set.with(Capability::Create);
        }
        if connector.as_modify().is_some() {
            set = set.with(Capability::Modify);
        }
        if connector.as_delete().is_some() {
            set = set.with(Capability::Delete);
        }
        if connector.as_authenticate().is_some() {
            set = set.with(Capability::Authenticate);
        }
        if connector.as_test_connection().is_some() {
            set = set.with(Capability::TestConnection);
        }
        set
    }

    /// Set with one more capability
    #[must_use]
    pub fn with(self, capability: Capability) -> Self {
        Self(self.0 | capability.bit())
    }

    pub fn contains(self, capability: Capability) -> bool {
        self.0 & capability.bit() != 0
    }

    /// Capabilities in `self` but not in `other`
    #[must_use]
    pub fn difference(self, other: CapabilitySet) -> Self {
        Self(self.0 & !other.0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Capabilities in declaration order
    pub fn iter(self) -> impl Iterator<Item = Capability> {
        Capability::ALL.into_iter().filter(move |c| self.contains(*c))
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), CapabilitySet::with)
    }
}

impl fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.iter().map(|c| c.to_string()).collect();
        write!(f, "[{}]", names.join(", "))
    }
}

// ============================================================================
// Dependencies
// ============================================================================

/// Identity of a managed component type
#[derive(Debug, Clone, Copy)]
pub struct ComponentKey {
    id: TypeId,
    name: &'static str,
}

impl ComponentKey {
    /// Key for the Rust type `T`
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Full type name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without its module path
    pub fn short_name(&self) -> &'static str {
        let base = self.name.split('<').next().unwrap_or(self.name);
        base.rsplit("::").next().unwrap_or(base)
    }
}

impl PartialEq for ComponentKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ComponentKey {}

impl std::hash::Hash for ComponentKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Request for a named property set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyRequest {
    /// Name of the set
    pub set: String,
    /// Keys the resolved set must contain
    pub required_keys: Vec<String>,
}

impl PropertyRequest {
    pub fn new(set: impl Into<String>) -> Self {
        Self {
            set: set.into(),
            required_keys: Vec::new(),
        }
    }
}

/// A constructor parameter declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parameter {
    /// Injected with a resolved property set
    Property(PropertyRequest),
    /// Injected with another managed component
    Component(ComponentKey),
    /// A parameter the host has no way to supply
    Plain { name: String, type_name: String },
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parameter::Property(req) => write!(f, "property set '{}'", req.set),
            Parameter::Component(key) => write!(f, "component {key}"),
            Parameter::Plain { name, type_name } => write!(f, "plain parameter {name}: {type_name}"),
        }
    }
}

/// A validated, injectable dependency
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dependency {
    Property(PropertyRequest),
    Component(ComponentKey),
}
