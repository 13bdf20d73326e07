//! Connector capability traits
//!
//! A connector supports an operation by implementing the matching
//! `*Operations` trait and returning itself from the corresponding `as_*`
//! accessor on [`Connector`]. The accessors default to `None`, so a connector
//! that overrides none of them supports nothing and every request it receives
//! is answered with "not supported".
//!
//! Handlers return `anyhow::Result`. An `Err` is a handler fault: the
//! dispatcher logs it and answers with a generic failure. To tell the client
//! that the backend is unavailable, return `Ok` with
//! [`ResultCode::Unavailable`](crate::types::ResultCode::Unavailable) instead.
//!
//! Connectors are shared across concurrent requests. Any state they keep must
//! tolerate concurrent use.

use crate::dispatch::{
    AddRequest, AuthenticateRequest, DeleteRequest, LdapResponse, ModifyRequest, SearchRequest,
    TestConnectionRequest, TestConnectionResponse,
};
use crate::filter::Filter;
use async_trait::async_trait;

/// Search capability
#[async_trait]
pub trait SearchOperations: Send + Sync {
    /// Run a search; `filter` is the request's filter, already parsed
    async fn search(&self, request: &SearchRequest, filter: &Filter) -> anyhow::Result<LdapResponse>;
}

/// Create capability
#[async_trait]
pub trait CreateOperations: Send + Sync {
    async fn create(&self, request: &AddRequest) -> anyhow::Result<LdapResponse>;
}

/// Modify capability
#[async_trait]
pub trait ModifyOperations: Send + Sync {
    async fn modify(&self, request: &ModifyRequest) -> anyhow::Result<LdapResponse>;
}

/// Delete capability
#[async_trait]
pub trait DeleteOperations: Send + Sync {
    async fn delete(&self, request: &DeleteRequest) -> anyhow::Result<LdapResponse>;
}

/// Authenticate capability
#[async_trait]
pub trait AuthenticateOperations: Send + Sync {
    async fn authenticate(&self, request: &AuthenticateRequest) -> anyhow::Result<LdapResponse>;
}

/// Test connection capability
#[async_trait]
pub trait TestConnectionOperations: Send + Sync {
    async fn test_connection(
        &self,
        request: &TestConnectionRequest,
    ) -> anyhow::Result<TestConnectionResponse>;
}

/// Core trait every connector implements
pub trait Connector: Send + Sync {
    fn as_search(&self) -> Option<&dyn SearchOperations> {
        None
    }

    fn as_create(&self) -> Option<&dyn CreateOperations> {
        None
    }

    fn as_modify(&self) -> Option<&dyn ModifyOperations> {
        None
    }

    fn as_delete(&self) -> Option<&dyn DeleteOperations> {
        None
    }

    fn as_authenticate(&self) -> Option<&dyn AuthenticateOperations> {
        None
    }

    fn as_test_connection(&self) -> Option<&dyn TestConnectionOperations> {
        None
    }
}
