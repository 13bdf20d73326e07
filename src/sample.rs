//! Sample directory connector
//!
//! An in-memory directory of US presidents under `o=pennaveiam`, served by a
//! connector that supports every operation. `DirectoryClient` stands in for
//! the client of a remote identity API: it is a managed component injected
//! with the datasource's custom properties and refuses to connect with the
//! wrong host or credentials.
//!
//! ```text
//! SampleConnector
//!   ├── DirectoryClient ◄── customDatasourceProperties (host, username, password)
//!   └── customDatasourceProperties
//! ```

use crate::config::{ConfigurationDescriptor, PropertyDeclaration};
use crate::connector::{
    AuthenticateOperations, Connector, CreateOperations, DeleteOperations, ModifyOperations,
    SearchOperations, TestConnectionOperations,
};
use crate::dispatch::{
    AddRequest, AuthenticateRequest, DeleteRequest, LdapResponse, ModificationOp, ModifyRequest,
    SearchRequest, TestConnectionRequest, TestConnectionResponse,
};
use crate::error::Result;
use crate::filter::Filter;
use crate::inject::{Deployment, InjectionResolver};
use crate::ldap::{Dn, Entry};
use crate::metadata::{Capability, ComponentCatalog, ConnectorRegistration, Constructor, ManagedComponent};
use crate::properties::names::CUSTOM_DATASOURCE_PROPERTIES;
use crate::properties::{DatasourcePropertySource, PropertySet};
use crate::types::{DataType, JsonValue, SearchScope};
use anyhow::{bail, Context};
use async_trait::async_trait;
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Connector name
pub const NAME: &str = "pennave";

/// Host the client accepts
pub const HOST: &str = "api.pennaveiam.local";

/// Base DN of the sample directory
pub const BASE_DN: &str = "o=pennaveiam";

const USERNAME: &str = "admin";
const PASSWORD: &str = "Password1";

// ============================================================================
// Client
// ============================================================================

/// In-memory directory client
///
/// Entries are keyed by their normalized DN. All methods are safe to call
/// concurrently.
pub struct DirectoryClient {
    host: String,
    base: Dn,
    entries: RwLock<BTreeMap<String, Entry>>,
    passwords: RwLock<HashMap<String, String>>,
    available: AtomicBool,
}

impl DirectoryClient {
    /// Connect with the datasource's custom properties
    pub fn connect(properties: &PropertySet) -> anyhow::Result<Self> {
        let host = properties.get_str("host").unwrap_or_default();
        let username = properties.get_str("username").unwrap_or_default();
        let password = properties.get_str("password").unwrap_or_default();

        if host != HOST {
            bail!("Unknown host '{host}'");
        }
        if username != USERNAME {
            bail!("Invalid username");
        }
        if password != PASSWORD {
            bail!("Invalid password");
        }

        let base = Dn::parse(BASE_DN)?;
        let mut entries = BTreeMap::new();
        let mut passwords = HashMap::new();
        for user in seed_users() {
            let username = user["username"].as_str().unwrap_or_default().to_string();
            let dn = Dn::parse(&format!("username={username},{BASE_DN}"))?;
            let entry = Entry::from_json(dn, &user)?;
            passwords.insert(entry.dn().normalized(), format!("{username}1789"));
            entries.insert(entry.dn().normalized(), entry);
        }

        info!(host = %host, entries = entries.len(), "Connected to sample directory");
        Ok(Self {
            host: host.to_string(),
            base,
            entries: RwLock::new(entries),
            passwords: RwLock::new(passwords),
            available: AtomicBool::new(true),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn base(&self) -> &Dn {
        &self.base
    }

    /// Take the backend offline or bring it back
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    /// Look up a user by username, ignoring case
    pub async fn get_user(&self, username: &str) -> Option<Entry> {
        let entries = self.entries.read().await;
        entries
            .values()
            .find(|e| {
                e.first("username")
                    .is_some_and(|u| u.to_string().eq_ignore_ascii_case(username))
            })
            .cloned()
    }

    pub async fn get(&self, dn: &Dn) -> Option<Entry> {
        self.entries.read().await.get(&dn.normalized()).cloned()
    }

    pub async fn all_users(&self) -> Vec<Entry> {
        self.entries.read().await.values().cloned().collect()
    }

    /// Insert an entry; `false` if one already exists at its DN
    pub async fn insert(&self, entry: Entry) -> bool {
        let mut entries = self.entries.write().await;
        let key = entry.dn().normalized();
        if entries.contains_key(&key) {
            return false;
        }
        entries.insert(key, entry);
        true
    }

    /// Apply a change to an entry; `false` if there is none at `dn`
    pub async fn update(&self, dn: &Dn, change: impl FnOnce(&mut Entry)) -> bool {
        let mut entries = self.entries.write().await;
        match entries.get_mut(&dn.normalized()) {
            Some(entry) => {
                change(entry);
                true
            }
            None => false,
        }
    }

    pub async fn remove(&self, dn: &Dn) -> bool {
        self.passwords.write().await.remove(&dn.normalized());
        self.entries.write().await.remove(&dn.normalized()).is_some()
    }

    pub async fn check_password(&self, dn: &Dn, password: &str) -> bool {
        self.passwords
            .read()
            .await
            .get(&dn.normalized())
            .is_some_and(|p| p == password)
    }
}

fn seed_users() -> Vec<JsonValue> {
    vec![
        json!({"username": "washington", "firstName": "George", "lastName": "Washington",
               "termsServed": 2, "party": "Independent", "objectClass": ["top", "president"]}),
        json!({"username": "adams", "firstName": "John", "lastName": "Adams",
               "termsServed": 1, "party": "Federalist", "objectClass": ["top", "president"]}),
        json!({"username": "jefferson", "firstName": "Thomas", "lastName": "Jefferson",
               "termsServed": 2, "party": "Democratic-Republican", "objectClass": ["top", "president"]}),
        json!({"username": "madison", "firstName": "James", "lastName": "Madison",
               "termsServed": 2, "party": "Democratic-Republican", "objectClass": ["top", "president"]}),
    ]
}

// ============================================================================
// Connector
// ============================================================================

/// Connector serving the sample directory
pub struct SampleConnector {
    client: Arc<DirectoryClient>,
    size_limit: Option<usize>,
}

impl SampleConnector {
    pub fn new(client: Arc<DirectoryClient>, properties: &PropertySet) -> Self {
        let size_limit = properties
            .get_f64("sizeLimit")
            .filter(|n| *n >= 1.0)
            .map(|n| n as usize);
        Self { client, size_limit }
    }

    pub fn client(&self) -> &Arc<DirectoryClient> {
        &self.client
    }

    fn offline(&self) -> Option<LdapResponse> {
        (!self.client.is_available()).then(|| LdapResponse::unavailable("sample directory is offline"))
    }
}

impl Connector for SampleConnector {
    fn as_search(&self) -> Option<&dyn SearchOperations> {
        Some(self)
    }

    fn as_create(&self) -> Option<&dyn CreateOperations> {
        Some(self)
    }

    fn as_modify(&self) -> Option<&dyn ModifyOperations> {
        Some(self)
    }

    fn as_delete(&self) -> Option<&dyn DeleteOperations> {
        Some(self)
    }

    fn as_authenticate(&self) -> Option<&dyn AuthenticateOperations> {
        Some(self)
    }

    fn as_test_connection(&self) -> Option<&dyn TestConnectionOperations> {
        Some(self)
    }
}

fn target(dn: &str) -> std::result::Result<Dn, LdapResponse> {
    Dn::parse(dn).map_err(|e| LdapResponse::protocol_error(e.to_string()))
}

#[async_trait]
impl SearchOperations for SampleConnector {
    async fn search(&self, request: &SearchRequest, filter: &Filter) -> anyhow::Result<LdapResponse> {
        if let Some(response) = self.offline() {
            return Ok(response);
        }
        let base = match target(&request.base_dn) {
            Ok(dn) => dn,
            Err(response) => return Ok(response),
        };

        let candidates = if request.scope == SearchScope::Base {
            // username=washington,o=pennaveiam -> washington
            let Some(username) = base.leftmost().map(|rdn| rdn.value()) else {
                return Ok(LdapResponse::operations_error(format!(
                    "no user named by '{}'",
                    request.base_dn
                )));
            };
            match self.client.get_user(username).await {
                Some(entry) => vec![entry],
                None => {
                    return Ok(LdapResponse::operations_error(format!(
                        "user '{username}' does not exist"
                    )))
                }
            }
        } else {
            self.client
                .all_users()
                .await
                .into_iter()
                .filter(|e| match request.scope {
                    SearchScope::OneLevel => e.dn().is_child_of(&base),
                    _ => e.dn().is_descendant_of(&base),
                })
                .collect()
        };

        let limit = request.size_limit.or(self.size_limit).unwrap_or(usize::MAX);
        let matched: Vec<Entry> = candidates
            .into_iter()
            .filter(|e| filter.matches(e))
            .take(limit)
            .collect();
        debug!(base = %base, filter = %filter, matched = matched.len(), "Sample search");
        Ok(LdapResponse::entries(&matched, &request.attributes))
    }
}

#[async_trait]
impl CreateOperations for SampleConnector {
    async fn create(&self, request: &AddRequest) -> anyhow::Result<LdapResponse> {
        if let Some(response) = self.offline() {
            return Ok(response);
        }
        let dn = match target(&request.dn) {
            Ok(dn) => dn,
            Err(response) => return Ok(response),
        };
        if !dn.is_child_of(self.client.base()) {
            return Ok(LdapResponse::operations_error(format!(
                "'{dn}' is not directly below '{}'",
                self.client.base()
            )));
        }
        let entry = Entry::from_json(dn.clone(), &JsonValue::Object(request.attributes.clone()))
            .context("invalid attributes")?;
        if self.client.insert(entry).await {
            Ok(LdapResponse::success())
        } else {
            Ok(LdapResponse::operations_error(format!("'{dn}' already exists")))
        }
    }
}

#[async_trait]
impl ModifyOperations for SampleConnector {
    async fn modify(&self, request: &ModifyRequest) -> anyhow::Result<LdapResponse> {
        if let Some(response) = self.offline() {
            return Ok(response);
        }
        let dn = match target(&request.dn) {
            Ok(dn) => dn,
            Err(response) => return Ok(response),
        };
        let applied = self
            .client
            .update(&dn, |entry| {
                for modification in &request.modifications {
                    let values = modification.values.clone();
                    match modification.op {
                        ModificationOp::Add => entry.add_values(&modification.attribute, values),
                        ModificationOp::Replace => entry.replace_values(&modification.attribute, values),
                        ModificationOp::Delete => entry.remove_values(&modification.attribute, &values),
                    }
                }
            })
            .await;
        if applied {
            Ok(LdapResponse::success())
        } else {
            Ok(LdapResponse::operations_error(format!("'{dn}' does not exist")))
        }
    }
}

#[async_trait]
impl DeleteOperations for SampleConnector {
    async fn delete(&self, request: &DeleteRequest) -> anyhow::Result<LdapResponse> {
        if let Some(response) = self.offline() {
            return Ok(response);
        }
        let dn = match target(&request.dn) {
            Ok(dn) => dn,
            Err(response) => return Ok(response),
        };
        if self.client.remove(&dn).await {
            Ok(LdapResponse::success())
        } else {
            Ok(LdapResponse::operations_error(format!("'{dn}' does not exist")))
        }
    }
}

#[async_trait]
impl AuthenticateOperations for SampleConnector {
    async fn authenticate(&self, request: &AuthenticateRequest) -> anyhow::Result<LdapResponse> {
        if let Some(response) = self.offline() {
            return Ok(response);
        }
        let dn = match target(&request.dn) {
            Ok(dn) => dn,
            Err(response) => return Ok(response),
        };
        if self.client.check_password(&dn, &request.password).await {
            Ok(LdapResponse::success())
        } else {
            Ok(LdapResponse::operations_error("invalid credentials"))
        }
    }
}

#[async_trait]
impl TestConnectionOperations for SampleConnector {
    async fn test_connection(&self, request: &TestConnectionRequest) -> anyhow::Result<TestConnectionResponse> {
        if !self.client.is_available() {
            return Ok(TestConnectionResponse::failed(&request.target, "sample directory is offline"));
        }
        if request.target.eq_ignore_ascii_case(self.client.host()) {
            Ok(TestConnectionResponse::succeeded(&request.target))
        } else {
            Ok(TestConnectionResponse::failed(
                &request.target,
                format!("connected to '{}'", self.client.host()),
            ))
        }
    }
}

// ============================================================================
// Registration
// ============================================================================

/// Configuration descriptor of the sample connector
pub fn configuration() -> ConfigurationDescriptor {
    ConfigurationDescriptor {
        name: NAME.to_string(),
        description: Some("Sample in-memory directory of US presidents".to_string()),
        meta: vec![
            PropertyDeclaration::new("host", DataType::String)
                .required()
                .with_regex(r"[A-Za-z0-9.-]+"),
            PropertyDeclaration::new("username", DataType::String).required(),
            PropertyDeclaration::new("password", DataType::Password).required(),
            PropertyDeclaration::new("sizeLimit", DataType::Number).with_default(100),
        ],
    }
}

/// Managed components of the sample artifact
pub fn catalog() -> Result<ComponentCatalog> {
    ComponentCatalog::new().with(ManagedComponent::of::<DirectoryClient>().constructor(
        Constructor::new()
            .property_with_keys(CUSTOM_DATASOURCE_PROPERTIES, ["host", "username", "password"])
            .build(|args| DirectoryClient::connect(args.properties(0)?)),
    ))
}

/// Connector registration of the sample artifact
pub fn registration() -> ConnectorRegistration {
    ConnectorRegistration::from_configuration(configuration())
        .supports_all(Capability::ALL)
        .constructor(
            Constructor::new()
                .component::<DirectoryClient>()
                .property(CUSTOM_DATASOURCE_PROPERTIES)
                .build(|args| {
                    Ok(SampleConnector::new(
                        args.component::<DirectoryClient>(0)?,
                        args.properties(1)?,
                    ))
                }),
        )
}

/// Deploy the sample connector for a datasource configured with `values`
pub fn deploy(values: JsonValue) -> Result<Deployment> {
    let catalog = catalog()?;
    let descriptor = catalog.load_connector(registration())?;
    let source = DatasourcePropertySource::from_json(configuration(), values)?;
    InjectionResolver::new(Arc::new(catalog), Arc::new(source)).deploy(Arc::new(descriptor))
}

/// Datasource values the sample client accepts
pub fn default_datasource() -> JsonValue {
    json!({ "host": HOST, "username": USERNAME, "password": PASSWORD })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> DirectoryClient {
        let props = PropertySet::new(CUSTOM_DATASOURCE_PROPERTIES)
            .with("host", HOST)
            .with("username", USERNAME)
            .with("password", crate::properties::PropertyValue::Password(PASSWORD.into()));
        DirectoryClient::connect(&props).unwrap()
    }

    #[test]
    fn test_connect_rejects_bad_credentials() {
        let props = PropertySet::new(CUSTOM_DATASOURCE_PROPERTIES)
            .with("host", HOST)
            .with("username", USERNAME)
            .with("password", "wrong");
        let err = DirectoryClient::connect(&props).err().unwrap();
        assert_eq!(err.to_string(), "Invalid password");

        let props = PropertySet::new(CUSTOM_DATASOURCE_PROPERTIES).with("host", "example.com");
        assert!(DirectoryClient::connect(&props).is_err());
    }

    #[tokio::test]
    async fn test_client_lookup() {
        let client = client();
        assert_eq!(client.all_users().await.len(), 4);
        let adams = client.get_user("ADAMS").await.unwrap();
        assert_eq!(adams.dn().to_string(), "username=adams,o=pennaveiam");
        assert!(client.check_password(adams.dn(), "adams1789").await);
        assert!(!client.check_password(adams.dn(), "nope").await);
    }

    #[tokio::test]
    async fn test_client_insert_and_remove() {
        let client = client();
        let dn = Dn::parse("username=monroe,o=pennaveiam").unwrap();
        let entry = Entry::new(dn.clone()).with("username", "monroe");
        assert!(client.insert(entry.clone()).await);
        assert!(!client.insert(entry).await);
        assert!(client.remove(&dn).await);
        assert!(!client.remove(&dn).await);
    }

    #[tokio::test]
    async fn test_offline_backend_is_unavailable() {
        let client = Arc::new(client());
        let connector = SampleConnector::new(Arc::clone(&client), &PropertySet::new(CUSTOM_DATASOURCE_PROPERTIES));
        let request = SearchRequest::new(BASE_DN, "(username=*)");
        let filter = Filter::parse(&request.filter).unwrap();

        client.set_available(false);
        let response = connector.search(&request, &filter).await.unwrap();
        assert_eq!(response.result_code, crate::types::ResultCode::Unavailable);

        client.set_available(true);
        let response = connector.search(&request, &filter).await.unwrap();
        assert!(response.is_success());
    }

    #[test]
    fn test_configuration_is_valid() {
        configuration().validate().unwrap();
    }

    #[test]
    fn test_deploy_with_defaults() {
        let deployment = deploy(default_datasource()).unwrap();
        assert_eq!(deployment.descriptor().name(), NAME);
        assert_eq!(deployment.capabilities().len(), 6);
        assert_eq!(deployment.components_built(), 1);
    }
}
