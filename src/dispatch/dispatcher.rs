//! Capability dispatcher

use super::payload;
use super::types::{LdapResponse, ProtocolRequest, ProtocolResponse, TestConnectionResponse};
use crate::config::DispatchConfig;
use crate::connector::Connector;
use crate::filter::Filter;
use crate::inject::Deployment;
use crate::metadata::Capability;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// Routes protocol requests to deployed connectors
///
/// Stateless apart from its configuration; share one instance across tasks.
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    config: DispatchConfig,
}

/// Why a handler produced no response
enum Fault {
    Handler(anyhow::Error),
    Panic(String),
    Timeout(Duration),
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::Handler(e) => write!(f, "handler failed: {e:#}"),
            Fault::Panic(message) => write!(f, "handler panicked: {message}"),
            Fault::Timeout(limit) => write!(f, "handler did not respond within {}ms", limit.as_millis()),
        }
    }
}

/// Raw handler output before it is checked
enum Outcome {
    Ldap(LdapResponse),
    TestConnection(TestConnectionResponse),
}

impl Dispatcher {
    pub fn new(config: DispatchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Route a request to the deployment's connector
    ///
    /// Never fails: every fault is converted into a response.
    ///
    /// # Example
    ///
    /// ```
    /// use dirconnect::dispatch::{DeleteRequest, Dispatcher, ProtocolRequest};
    /// use dirconnect::sample;
    ///
    /// # tokio_test::block_on(async {
    /// let deployment = sample::deploy(sample::default_datasource()).unwrap();
    /// let request = ProtocolRequest::Delete(DeleteRequest {
    ///     dn: "username=adams,o=pennaveiam".into(),
    /// });
    /// let response = Dispatcher::default().dispatch(&deployment, request).await;
    /// assert!(response.as_ldap().unwrap().is_success());
    /// # });
    /// ```
    pub async fn dispatch(&self, deployment: &Deployment, request: ProtocolRequest) -> ProtocolResponse {
        let kind = request.kind();
        let connector_name = deployment.descriptor().name();

        if !deployment
            .capabilities()
            .contains(Capability::for_operation(kind))
        {
            debug!(
                connector = %connector_name,
                operation = %kind,
                "Operation not supported by connector"
            );
            return ProtocolResponse::NotSupported { operation: kind };
        }

        let started = Instant::now();
        let result = match self.invoke(deployment, &request).await {
            Some(result) => result,
            None => return ProtocolResponse::NotSupported { operation: kind },
        };

        let response = match result {
            Ok(Outcome::Ldap(response)) => match checked(response) {
                Ok(response) => ProtocolResponse::Ldap(response),
                Err(violation) => {
                    error!(
                        connector = %connector_name,
                        operation = %kind,
                        target = %request.target(),
                        violation = %violation,
                        "Connector returned a payload the transport cannot carry"
                    );
                    ProtocolResponse::Ldap(LdapResponse::other(format!(
                        "invalid response payload: {violation}"
                    )))
                }
            },
            Ok(Outcome::TestConnection(response)) => ProtocolResponse::TestConnection(response),
            Err(Rejected::Filter(message)) => {
                warn!(
                    connector = %connector_name,
                    target = %request.target(),
                    "{message}"
                );
                ProtocolResponse::Ldap(LdapResponse::protocol_error(message))
            }
            Err(Rejected::Fault(fault)) => {
                error!(
                    connector = %connector_name,
                    operation = %kind,
                    target = %request.target(),
                    "Dispatch failed: {fault}"
                );
                match &request {
                    ProtocolRequest::TestConnection(req) => ProtocolResponse::TestConnection(
                        TestConnectionResponse::failed(&req.target, fault.to_string()),
                    ),
                    _ => ProtocolResponse::Ldap(LdapResponse::other(fault.to_string())),
                }
            }
        };

        debug!(
            connector = %connector_name,
            operation = %kind,
            result = %response.result_code(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Dispatched request"
        );
        response
    }

    /// Call the handler for `request`, `None` if the connector has none
    ///
    /// The handler runs on its own task so that one which blocks its thread
    /// still cannot hold the caller past the timeout.
    async fn invoke(
        &self,
        deployment: &Deployment,
        request: &ProtocolRequest,
    ) -> Option<Result<Outcome, Rejected>> {
        let mut task = tokio::spawn(call(Arc::clone(deployment.connector()), request.clone()));

        let limit = self.config.timeout();
        match tokio::time::timeout(limit, &mut task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) if join_error.is_panic() => Some(Err(Rejected::Fault(Fault::Panic(
                panic_message(join_error.into_panic().as_ref()),
            )))),
            Ok(Err(join_error)) => Some(Err(Rejected::Fault(Fault::Handler(join_error.into())))),
            Err(_) => {
                // Abandons the handler at its next await point
                task.abort();
                Some(Err(Rejected::Fault(Fault::Timeout(limit))))
            }
        }
    }
}

async fn call(connector: Arc<dyn Connector>, request: ProtocolRequest) -> Option<Result<Outcome, Rejected>> {
    let result = match &request {
        ProtocolRequest::Search(req) => {
            let handler = connector.as_search()?;
            let filter = match Filter::parse(&req.filter) {
                Ok(filter) => filter,
                Err(e) => return Some(Err(Rejected::Filter(e.to_string()))),
            };
            handler.search(req, &filter).await.map(Outcome::Ldap)
        }
        ProtocolRequest::Create(req) => connector.as_create()?.create(req).await.map(Outcome::Ldap),
        ProtocolRequest::Modify(req) => connector.as_modify()?.modify(req).await.map(Outcome::Ldap),
        ProtocolRequest::Delete(req) => connector.as_delete()?.delete(req).await.map(Outcome::Ldap),
        ProtocolRequest::Authenticate(req) => connector
            .as_authenticate()?
            .authenticate(req)
            .await
            .map(Outcome::Ldap),
        ProtocolRequest::TestConnection(req) => connector
            .as_test_connection()?
            .test_connection(req)
            .await
            .map(Outcome::TestConnection),
    };
    Some(result.map_err(|e| Rejected::Fault(Fault::Handler(e))))
}

enum Rejected {
    Filter(String),
    Fault(Fault),
}

fn checked(mut response: LdapResponse) -> Result<LdapResponse, String> {
    if let Some(payload) = response.payload.take() {
        response.payload = Some(payload::normalize(payload)?);
    }
    Ok(response)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
