//! Common types used throughout the connector host
//!
//! This module contains shared type definitions, type aliases,
//! and utility types used across multiple modules.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

// ============================================================================
// Property Data Type
// ============================================================================

/// Data type of a configuration property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataType {
    #[default]
    String,
    Password,
    Boolean,
    Number,
    List,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::String => write!(f, "STRING"),
            DataType::Password => write!(f, "PASSWORD"),
            DataType::Boolean => write!(f, "BOOLEAN"),
            DataType::Number => write!(f, "NUMBER"),
            DataType::List => write!(f, "LIST"),
        }
    }
}

// ============================================================================
// Result Code
// ============================================================================

/// Result code carried by every directory protocol response
///
/// Numeric values follow the LDAP result code registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultCode {
    Success,
    OperationsError,
    ProtocolError,
    Unavailable,
    UnwillingToPerform,
    Other,
}

impl ResultCode {
    /// Numeric LDAP result code
    pub fn code(self) -> u8 {
        match self {
            ResultCode::Success => 0,
            ResultCode::OperationsError => 1,
            ResultCode::ProtocolError => 2,
            ResultCode::Unavailable => 52,
            ResultCode::UnwillingToPerform => 53,
            ResultCode::Other => 80,
        }
    }

    /// Check if this code signals success
    pub fn is_success(self) -> bool {
        self == ResultCode::Success
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResultCode::Success => "success",
            ResultCode::OperationsError => "operationsError",
            ResultCode::ProtocolError => "protocolError",
            ResultCode::Unavailable => "unavailable",
            ResultCode::UnwillingToPerform => "unwillingToPerform",
            ResultCode::Other => "other",
        };
        write!(f, "{name} ({})", self.code())
    }
}

// ============================================================================
// Operation Kind
// ============================================================================

/// Kind of protocol operation a request carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Search,
    Create,
    Modify,
    Delete,
    Authenticate,
    TestConnection,
}

impl OperationKind {
    /// All operation kinds, in declaration order
    pub const ALL: [OperationKind; 6] = [
        OperationKind::Search,
        OperationKind::Create,
        OperationKind::Modify,
        OperationKind::Delete,
        OperationKind::Authenticate,
        OperationKind::TestConnection,
    ];
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationKind::Search => "search",
            OperationKind::Create => "create",
            OperationKind::Modify => "modify",
            OperationKind::Delete => "delete",
            OperationKind::Authenticate => "authenticate",
            OperationKind::TestConnection => "test_connection",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Search Scope
// ============================================================================

/// Scope of a search request relative to its base DN
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchScope {
    /// Only the base entry itself
    Base,
    /// Immediate children of the base entry
    OneLevel,
    /// The base entry and all of its descendants
    #[default]
    Subtree,
}

impl std::str::FromStr for SearchScope {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "base" => Ok(SearchScope::Base),
            "one" | "onelevel" | "one_level" => Ok(SearchScope::OneLevel),
            "sub" | "subtree" => Ok(SearchScope::Subtree),
            other => Err(format!("unknown search scope '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_serde() {
        let dt: DataType = serde_json::from_str("\"PASSWORD\"").unwrap();
        assert_eq!(dt, DataType::Password);

        let json = serde_json::to_string(&DataType::List).unwrap();
        assert_eq!(json, "\"LIST\"");
    }

    #[test]
    fn test_result_codes() {
        assert_eq!(ResultCode::Success.code(), 0);
        assert_eq!(ResultCode::Unavailable.code(), 52);
        assert_eq!(ResultCode::UnwillingToPerform.code(), 53);
        assert_eq!(ResultCode::Other.code(), 80);
        assert!(ResultCode::Success.is_success());
        assert!(!ResultCode::OperationsError.is_success());
        assert_eq!(ResultCode::ProtocolError.to_string(), "protocolError (2)");
    }

    #[test]
    fn test_search_scope_parse() {
        assert_eq!("base".parse::<SearchScope>().unwrap(), SearchScope::Base);
        assert_eq!("ONE".parse::<SearchScope>().unwrap(), SearchScope::OneLevel);
        assert_eq!("sub".parse::<SearchScope>().unwrap(), SearchScope::Subtree);
        assert!("children".parse::<SearchScope>().is_err());
    }
}
