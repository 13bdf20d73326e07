//! Integration tests against the sample connector
//!
//! Tests the full flow: registration → injection → dispatch → response payload

use dirconnect::config::{ConfigurationDescriptor, HostConfig};
use dirconnect::dispatch::{
    AddRequest, AuthenticateRequest, DeleteRequest, Dispatcher, LdapResponse, Modification,
    ModificationOp, ModifyRequest, ProtocolRequest, ProtocolResponse, SearchRequest,
    TestConnectionRequest,
};
use dirconnect::inject::{Deployment, InjectionResolver};
use dirconnect::ldap::{Dn, EntryValue};
use dirconnect::properties::names::{PRIMARY_KEY_ATTRIBUTES, SCHEMA_CATALOG};
use dirconnect::properties::{DatasourcePropertySource, PropertySource};
use dirconnect::sample;
use dirconnect::schema::{build_schema, load_entities_from_str};
use dirconnect::{Error, Filter, ResultCode, SearchScope};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;

fn deployment() -> Deployment {
    sample::deploy(sample::default_datasource()).unwrap()
}

async fn send(deployment: &Deployment, request: ProtocolRequest) -> LdapResponse {
    match Dispatcher::default().dispatch(deployment, request).await {
        ProtocolResponse::Ldap(response) => response,
        other => panic!("expected an LDAP response, got {other:?}"),
    }
}

async fn search(deployment: &Deployment, request: SearchRequest) -> LdapResponse {
    send(deployment, ProtocolRequest::Search(request)).await
}

fn dns(response: &LdapResponse) -> Vec<String> {
    response.payload.as_ref().unwrap()["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["dn"].as_str().unwrap().to_string())
        .collect()
}

// ============================================================================
// Deployment
// ============================================================================

#[test]
fn test_deploy_rejects_bad_credentials() {
    let err = sample::deploy(json!({
        "host": sample::HOST,
        "username": "admin",
        "password": "hunter2"
    }))
    .unwrap_err();

    match err {
        Error::UnresolvableDependency { component, reason } => {
            assert_eq!(component, "DirectoryClient");
            assert!(reason.contains("Invalid password"), "{reason}");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_deploy_rejects_missing_property() {
    let err = sample::deploy(json!({"host": sample::HOST, "username": "admin"})).unwrap_err();
    assert!(err.is_fatal());
    assert!(err.to_string().contains("password"), "{err}");
}

#[test]
fn test_deploy_rejects_undeclared_property() {
    let mut values = sample::default_datasource();
    values["port"] = json!(389);
    assert!(sample::deploy(values).is_err());
}

#[tokio::test]
async fn test_deploy_all_datasources() {
    let catalog = Arc::new(sample::catalog().unwrap());
    let descriptor = Arc::new(catalog.load_connector(sample::registration()).unwrap());

    let datasources = [
        sample::default_datasource(),
        json!({"host": "ldap.example.com", "username": "admin", "password": "Password1"}),
    ];
    let deployments = datasources.into_iter().map(|values| {
        let source = DatasourcePropertySource::from_json(sample::configuration(), values).unwrap();
        (
            InjectionResolver::new(Arc::clone(&catalog), Arc::new(source)),
            Arc::clone(&descriptor),
        )
    });

    let results = InjectionResolver::deploy_all(deployments).await;
    assert!(results[0].is_ok());
    assert!(results[1].is_err());
}

// ============================================================================
// Search
// ============================================================================

#[tokio::test]
async fn test_subtree_search_with_filter() {
    let deployment = deployment();
    let response = search(
        &deployment,
        SearchRequest::new(sample::BASE_DN, "(&(termsServed>=2)(objectClass=president))"),
    )
    .await;

    assert_eq!(response.result_code, ResultCode::Success);
    assert_eq!(
        dns(&response),
        vec![
            "username=jefferson,o=pennaveiam",
            "username=madison,o=pennaveiam",
            "username=washington,o=pennaveiam",
        ]
    );
}

#[tokio::test]
async fn test_base_search_returns_named_user() {
    let deployment = deployment();
    let response = search(
        &deployment,
        SearchRequest::new("username=washington,o=pennaveiam", "(objectClass=*)")
            .with_scope(SearchScope::Base)
            .with_attributes(["firstName", "termsServed"]),
    )
    .await;

    assert_eq!(dns(&response), vec!["username=washington,o=pennaveiam"]);
    let attributes = &response.payload.as_ref().unwrap()["entries"][0]["attributes"];
    assert_eq!(attributes["firstName"], json!(["George"]));
    assert_eq!(attributes["termsServed"][0].as_f64(), Some(2.0));
    assert!(attributes.get("lastName").is_none());
}

#[tokio::test]
async fn test_base_search_missing_user() {
    let deployment = deployment();
    let response = search(
        &deployment,
        SearchRequest::new("username=lincoln,o=pennaveiam", "(objectClass=*)").with_scope(SearchScope::Base),
    )
    .await;

    assert_eq!(response.result_code, ResultCode::OperationsError);
    assert!(response.payload.is_none());
}

#[tokio::test]
async fn test_search_size_limit_and_substring() {
    let deployment = deployment();
    let response = search(
        &deployment,
        SearchRequest::new(sample::BASE_DN, "(|(lastName=*son)(party=federalist))").with_size_limit(2),
    )
    .await;
    assert_eq!(
        dns(&response),
        vec!["username=adams,o=pennaveiam", "username=jefferson,o=pennaveiam"]
    );
}

#[tokio::test]
async fn test_search_with_bad_filter() {
    let deployment = deployment();
    let response = search(&deployment, SearchRequest::new(sample::BASE_DN, "(termsServed>=)(x=1)")).await;
    assert_eq!(response.result_code, ResultCode::ProtocolError);
}

// ============================================================================
// Write Operations
// ============================================================================

#[tokio::test]
async fn test_entry_lifecycle() {
    let deployment = deployment();
    let dn = "username=monroe,o=pennaveiam";

    let mut attributes = serde_json::Map::new();
    attributes.insert("username".into(), json!("monroe"));
    attributes.insert("lastName".into(), json!("Monroe"));
    attributes.insert("termsServed".into(), json!(2));
    let create = ProtocolRequest::Create(AddRequest {
        dn: dn.to_string(),
        attributes,
    });
    assert!(send(&deployment, create.clone()).await.is_success());
    assert_eq!(
        send(&deployment, create).await.result_code,
        ResultCode::OperationsError
    );

    let modify = ProtocolRequest::Modify(ModifyRequest {
        dn: dn.to_string(),
        modifications: vec![
            Modification::new(ModificationOp::Add, "firstName", vec![EntryValue::from("James")]),
            Modification::new(ModificationOp::Replace, "termsServed", vec![EntryValue::from(3_i64)]),
        ],
    });
    assert!(send(&deployment, modify).await.is_success());

    let response = search(&deployment, SearchRequest::new(sample::BASE_DN, "(&(firstName=james)(termsServed=3))")).await;
    assert_eq!(dns(&response), vec![dn]);

    let delete = ProtocolRequest::Delete(DeleteRequest { dn: dn.to_string() });
    assert!(send(&deployment, delete.clone()).await.is_success());
    assert_eq!(
        send(&deployment, delete).await.result_code,
        ResultCode::OperationsError
    );
}

#[tokio::test]
async fn test_create_outside_base_rejected() {
    let deployment = deployment();
    let create = ProtocolRequest::Create(AddRequest {
        dn: "cn=intruder,o=elsewhere".to_string(),
        attributes: serde_json::Map::new(),
    });
    assert_eq!(
        send(&deployment, create).await.result_code,
        ResultCode::OperationsError
    );
}

#[tokio::test]
async fn test_deployments_are_isolated() {
    let first = deployment();
    let second = deployment();
    let delete = ProtocolRequest::Delete(DeleteRequest {
        dn: "username=adams,o=pennaveiam".to_string(),
    });
    assert!(send(&first, delete).await.is_success());

    let response = search(&second, SearchRequest::new(sample::BASE_DN, "(username=adams)")).await;
    assert_eq!(dns(&response).len(), 1);
}

// ============================================================================
// Authenticate and Test Connection
// ============================================================================

#[tokio::test]
async fn test_authenticate() {
    let deployment = deployment();
    let bind = |password: &str| {
        ProtocolRequest::Authenticate(AuthenticateRequest {
            dn: "username=jefferson,o=pennaveiam".to_string(),
            password: password.to_string(),
        })
    };

    assert!(send(&deployment, bind("jefferson1789")).await.is_success());
    let response = send(&deployment, bind("wrong")).await;
    assert_eq!(response.result_code, ResultCode::OperationsError);
    assert_eq!(response.diagnostic.as_deref(), Some("invalid credentials"));
}

#[tokio::test]
async fn test_test_connection() {
    let deployment = deployment();
    let dispatcher = Dispatcher::default();

    let response = dispatcher
        .dispatch(
            &deployment,
            ProtocolRequest::TestConnection(TestConnectionRequest {
                target: sample::HOST.to_string(),
            }),
        )
        .await;
    assert!(response.as_test_connection().unwrap().succeeded);

    let response = dispatcher
        .dispatch(
            &deployment,
            ProtocolRequest::TestConnection(TestConnectionRequest {
                target: "elsewhere".to_string(),
            }),
        )
        .await;
    assert!(!response.as_test_connection().unwrap().succeeded);
}

#[tokio::test]
async fn test_raw_request_round_trip() {
    let deployment = deployment();
    let request: ProtocolRequest = serde_json::from_value(json!({
        "operation": "search",
        "base_dn": "o=pennaveiam",
        "scope": "one_level",
        "filter": "(lastName~=Adamz)"
    }))
    .unwrap();
    let response = Dispatcher::new(HostConfig::default().dispatch)
        .dispatch(&deployment, request)
        .await;

    let value: Value = serde_json::to_value(&response).unwrap();
    assert_eq!(value["type"], "ldap");
    assert_eq!(value["resultCode"], "SUCCESS");
    assert_eq!(value["payload"]["entries"][0]["dn"], "username=adams,o=pennaveiam");
}

// ============================================================================
// Schema and Properties
// ============================================================================

const PRESIDENT_ENTITIES: &str = r"
- name: President
  attributes:
    - name: username
      type: STRING
      isNamingAttribute: true
    - name: lastName
      type: STRING
    - name: termsServed
      type: INTEGER
      nullable: false
";

#[test]
fn test_schema_published_as_property_sets() {
    let schema = build_schema(&load_entities_from_str(PRESIDENT_ENTITIES).unwrap()).unwrap();
    let source = DatasourcePropertySource::from_json(sample::configuration(), sample::default_datasource())
        .unwrap()
        .with_sets(schema.to_property_sets());

    let keys = source.property_set(PRIMARY_KEY_ATTRIBUTES).unwrap().unwrap();
    assert_eq!(keys.get_str("President"), Some("username"));
    let catalog = source.property_set(SCHEMA_CATALOG).unwrap().unwrap();
    assert_eq!(catalog.get_list("President").unwrap().len(), 3);
}

#[test]
fn test_mapped_entity_matches_filter() {
    let schema = build_schema(&load_entities_from_str(PRESIDENT_ENTITIES).unwrap()).unwrap();
    let entity = schema.entity("President").unwrap();
    let entry = entity
        .to_entry(
            &json!({"username": "lincoln", "lastName": "Lincoln", "termsServed": 2}),
            &Dn::parse(sample::BASE_DN).unwrap(),
        )
        .unwrap();

    assert_eq!(entry.dn().to_string(), "username=lincoln,o=pennaveiam");
    let filter = Filter::parse("(&(username=LINCOLN)(termsServed<=2)(!(lastName=Adams)))").unwrap();
    assert!(filter.matches(&entry));
}

#[test]
fn test_configuration_round_trip() {
    let json = serde_json::to_string(&sample::configuration()).unwrap();
    let parsed = ConfigurationDescriptor::from_json_str(&json).unwrap();
    assert_eq!(parsed, sample::configuration());
}
