//! Protocol request and response types

use crate::ldap::{Entry, EntryValue};
use crate::types::{JsonObject, JsonValue, OperationKind, ResultCode, SearchScope};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Requests
// ============================================================================

/// Search request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Base DN, e.g. `username=washington,o=pennaveiam`
    pub base_dn: String,
    #[serde(default)]
    pub scope: SearchScope,
    /// RFC 4515 filter string
    pub filter: String,
    /// Attributes to return; empty means all
    #[serde(default)]
    pub attributes: Vec<String>,
    #[serde(default)]
    pub size_limit: Option<usize>,
}

impl SearchRequest {
    /// Subtree search under `base_dn`
    pub fn new(base_dn: impl Into<String>, filter: impl Into<String>) -> Self {
        Self {
            base_dn: base_dn.into(),
            scope: SearchScope::default(),
            filter: filter.into(),
            attributes: Vec::new(),
            size_limit: None,
        }
    }

    #[must_use]
    pub fn with_scope(mut self, scope: SearchScope) -> Self {
        self.scope = scope;
        self
    }

    #[must_use]
    pub fn with_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = attributes.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_size_limit(mut self, limit: usize) -> Self {
        self.size_limit = Some(limit);
        self
    }
}

/// Add (create) request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddRequest {
    pub dn: String,
    /// Attribute name to a value or a list of values
    pub attributes: JsonObject,
}

/// How a modification changes an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModificationOp {
    Add,
    Delete,
    Replace,
}

/// One change inside a modify request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modification {
    pub op: ModificationOp,
    pub attribute: String,
    #[serde(default)]
    pub values: Vec<EntryValue>,
}

impl Modification {
    pub fn new(op: ModificationOp, attribute: impl Into<String>, values: Vec<EntryValue>) -> Self {
        Self {
            op,
            attribute: attribute.into(),
            values,
        }
    }
}

/// Modify request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifyRequest {
    pub dn: String,
    pub modifications: Vec<Modification>,
}

/// Delete request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteRequest {
    pub dn: String,
}

/// Authenticate (bind) request
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticateRequest {
    pub dn: String,
    pub password: String,
}

impl fmt::Debug for AuthenticateRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticateRequest")
            .field("dn", &self.dn)
            .field("password", &"***")
            .finish()
    }
}

/// Test connection request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestConnectionRequest {
    pub target: String,
}

/// A request from the directory front end, tagged by operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum ProtocolRequest {
    Search(SearchRequest),
    Create(AddRequest),
    Modify(ModifyRequest),
    Delete(DeleteRequest),
    Authenticate(AuthenticateRequest),
    TestConnection(TestConnectionRequest),
}

impl ProtocolRequest {
    pub fn kind(&self) -> OperationKind {
        match self {
            ProtocolRequest::Search(_) => OperationKind::Search,
            ProtocolRequest::Create(_) => OperationKind::Create,
            ProtocolRequest::Modify(_) => OperationKind::Modify,
            ProtocolRequest::Delete(_) => OperationKind::Delete,
            ProtocolRequest::Authenticate(_) => OperationKind::Authenticate,
            ProtocolRequest::TestConnection(_) => OperationKind::TestConnection,
        }
    }

    /// Identifier the request is aimed at, for logging
    pub fn target(&self) -> &str {
        match self {
            ProtocolRequest::Search(r) => &r.base_dn,
            ProtocolRequest::Create(r) => &r.dn,
            ProtocolRequest::Modify(r) => &r.dn,
            ProtocolRequest::Delete(r) => &r.dn,
            ProtocolRequest::Authenticate(r) => &r.dn,
            ProtocolRequest::TestConnection(r) => &r.target,
        }
    }
}

// ============================================================================
// Responses
// ============================================================================

/// Result of an LDAP-style operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LdapResponse {
    pub result_code: ResultCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<JsonValue>,
}

impl LdapResponse {
    /// Response with a result code and nothing else
    pub fn new(result_code: ResultCode) -> Self {
        Self {
            result_code,
            diagnostic: None,
            payload: None,
        }
    }

    pub fn success() -> Self {
        Self::new(ResultCode::Success)
    }

    /// Successful search carrying the given entries
    ///
    /// `attributes` selects the returned attributes; empty returns all.
    pub fn entries<'a>(entries: impl IntoIterator<Item = &'a Entry>, attributes: &[String]) -> Self {
        let entries: Vec<JsonValue> = entries.into_iter().map(|e| e.to_json(attributes)).collect();
        Self::success().with_payload(serde_json::json!({ "entries": entries }))
    }

    /// Failure response with a diagnostic message
    pub fn error(result_code: ResultCode, diagnostic: impl Into<String>) -> Self {
        Self::new(result_code).with_diagnostic(diagnostic)
    }

    pub fn operations_error(diagnostic: impl Into<String>) -> Self {
        Self::error(ResultCode::OperationsError, diagnostic)
    }

    pub fn protocol_error(diagnostic: impl Into<String>) -> Self {
        Self::error(ResultCode::ProtocolError, diagnostic)
    }

    /// The backend is unavailable; chosen by the connector
    pub fn unavailable(diagnostic: impl Into<String>) -> Self {
        Self::error(ResultCode::Unavailable, diagnostic)
    }

    pub fn other(diagnostic: impl Into<String>) -> Self {
        Self::error(ResultCode::Other, diagnostic)
    }

    #[must_use]
    pub fn with_payload(mut self, payload: JsonValue) -> Self {
        self.payload = Some(payload);
        self
    }

    #[must_use]
    pub fn with_diagnostic(mut self, diagnostic: impl Into<String>) -> Self {
        self.diagnostic = Some(diagnostic.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.result_code.is_success()
    }
}

/// Result of a test connection request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestConnectionResponse {
    pub target: String,
    pub succeeded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl TestConnectionResponse {
    pub fn succeeded(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            succeeded: true,
            message: None,
        }
    }

    pub fn failed(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            succeeded: false,
            message: Some(message.into()),
        }
    }
}

/// What the dispatcher hands back to the transport layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProtocolResponse {
    Ldap(LdapResponse),
    TestConnection(TestConnectionResponse),
    /// The connector does not declare the requested operation
    NotSupported { operation: OperationKind },
}

impl ProtocolResponse {
    /// Result code reported to the client
    pub fn result_code(&self) -> ResultCode {
        match self {
            ProtocolResponse::Ldap(response) => response.result_code,
            ProtocolResponse::TestConnection(response) if response.succeeded => ResultCode::Success,
            ProtocolResponse::TestConnection(_) => ResultCode::Other,
            ProtocolResponse::NotSupported { .. } => ResultCode::UnwillingToPerform,
        }
    }

    pub fn is_not_supported(&self) -> bool {
        matches!(self, ProtocolResponse::NotSupported { .. })
    }

    pub fn as_ldap(&self) -> Option<&LdapResponse> {
        match self {
            ProtocolResponse::Ldap(response) => Some(response),
            _ => None,
        }
    }

    pub fn as_test_connection(&self) -> Option<&TestConnectionResponse> {
        match self {
            ProtocolResponse::TestConnection(response) => Some(response),
            _ => None,
        }
    }
}
