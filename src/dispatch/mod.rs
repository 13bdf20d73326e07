//! Capability dispatcher module
//!
//! Routes protocol requests to the connector a datasource was deployed with.
//!
//! # Overview
//!
//! - `ProtocolRequest` / `ProtocolResponse` - Operation-tagged requests and
//!   the responses handed back to the transport layer
//! - `Dispatcher` - Capability check, handler invocation, fault containment
//!
//! A request for an operation the connector does not declare is answered
//! with `ProtocolResponse::NotSupported` without calling anything. That is
//! expected traffic and is only logged at debug level.

mod dispatcher;
mod payload;
mod types;

pub use dispatcher::Dispatcher;
pub use types::{
    AddRequest, AuthenticateRequest, DeleteRequest, LdapResponse, Modification, ModificationOp,
    ModifyRequest, ProtocolRequest, ProtocolResponse, SearchRequest, TestConnectionRequest,
    TestConnectionResponse,
};
