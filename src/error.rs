//! Error types for the connector host
//!
//! This module defines the error hierarchy for the whole crate.
//! Deployment-time errors (injection, schema authoring) are fatal to the
//! datasource being deployed. Request-time failures never surface as `Error`
//! from the dispatcher; they are converted into protocol responses.

use crate::schema::SchemaAuthoringError;
use thiserror::Error;

/// The main error type for the connector host
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid value for property '{property}': {message}")]
    InvalidProperty { property: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid regex: {0}")]
    Regex(#[from] regex::Error),

    // ============================================================================
    // Injection Errors
    // ============================================================================
    #[error("Unresolvable dependency for '{component}': {reason}")]
    UnresolvableDependency { component: String, reason: String },

    #[error("Cyclic dependency: {}", path.join(" -> "))]
    CyclicDependency { path: Vec<String> },

    #[error("Connector '{connector}' declares capability '{capability}' but does not implement it")]
    CapabilityMismatch {
        connector: String,
        capability: String,
    },

    // ============================================================================
    // Schema Errors
    // ============================================================================
    #[error(transparent)]
    SchemaAuthoring(#[from] SchemaAuthoringError),

    #[error("Cannot map '{entity}' to a directory entry: {message}")]
    Mapping { entity: String, message: String },

    // ============================================================================
    // Protocol Errors
    // ============================================================================
    #[error("Invalid search filter at offset {position}: {message}")]
    FilterSyntax { position: usize, message: String },

    #[error("Invalid distinguished name '{dn}': {message}")]
    InvalidDn { dn: String, message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid property error
    pub fn invalid_property(property: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidProperty {
            property: property.into(),
            message: message.into(),
        }
    }

    /// Create an unresolvable dependency error
    pub fn unresolvable(component: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnresolvableDependency {
            component: component.into(),
            reason: reason.into(),
        }
    }

    /// Create a capability mismatch error
    pub fn capability_mismatch(connector: impl Into<String>, capability: impl ToString) -> Self {
        Self::CapabilityMismatch {
            connector: connector.into(),
            capability: capability.to_string(),
        }
    }

    /// Create a mapping error
    pub fn mapping(entity: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Mapping {
            entity: entity.into(),
            message: message.into(),
        }
    }

    /// Create a filter syntax error
    pub fn filter_syntax(position: usize, message: impl Into<String>) -> Self {
        Self::FilterSyntax {
            position,
            message: message.into(),
        }
    }

    /// Create an invalid DN error
    pub fn invalid_dn(dn: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidDn {
            dn: dn.into(),
            message: message.into(),
        }
    }

    /// Whether this error aborts a datasource deployment
    ///
    /// Injection and schema errors happen once, at deployment time, and are
    /// reported to the deployer. Everything else is request-scoped.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::UnresolvableDependency { .. }
                | Error::CyclicDependency { .. }
                | Error::CapabilityMismatch { .. }
                | Error::SchemaAuthoring(_)
        )
    }
}

/// Result type alias for the connector host
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::unresolvable("Client", "unknown property set 'nope'");
        assert_eq!(
            err.to_string(),
            "Unresolvable dependency for 'Client': unknown property set 'nope'"
        );

        let err = Error::CyclicDependency {
            path: vec!["A".into(), "B".into(), "A".into()],
        };
        assert_eq!(err.to_string(), "Cyclic dependency: A -> B -> A");

        let err = Error::filter_syntax(3, "unbalanced parentheses");
        assert_eq!(
            err.to_string(),
            "Invalid search filter at offset 3: unbalanced parentheses"
        );
    }

    #[test]
    fn test_is_fatal() {
        assert!(Error::unresolvable("A", "x").is_fatal());
        assert!(Error::CyclicDependency { path: vec![] }.is_fatal());
        assert!(Error::capability_mismatch("c", "Search").is_fatal());

        assert!(!Error::filter_syntax(0, "empty").is_fatal());
        assert!(!Error::config("x").is_fatal());
        assert!(!Error::invalid_dn("x", "y").is_fatal());
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::config("inner"));
        let with_context = result.context("outer");
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Configuration error: inner"));
    }
}
