//! Schema authoring tests

use super::*;
use crate::error::Error;
use crate::ldap::Dn;
use crate::properties::names::{PRIMARY_KEY_ATTRIBUTES, SCHEMA_CATALOG};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::io::Write;
use test_case::test_case;

fn president() -> EntityDeclaration {
    EntityDeclaration::new("President")
        .attribute(AttributeDeclaration::new("firstName", TypeRef::String))
        .attribute(AttributeDeclaration::new("username", TypeRef::String).naming())
}

fn rule_of(declarations: &[EntityDeclaration]) -> SchemaRule {
    build_schema(declarations).unwrap_err().rule
}

#[test]
fn test_documented_entity_builds() {
    let schema = build_schema(&[president()]).unwrap();
    assert_eq!(schema.len(), 1);

    let entity = schema.entity("president").unwrap();
    assert_eq!(entity.name(), "President");
    assert_eq!(entity.naming_attribute().name, "username");
    assert_eq!(entity.attributes().len(), 2);
    assert_eq!(schema.naming_attribute("President").unwrap().name, "username");
}

#[test]
fn test_build_is_idempotent() {
    let declarations = vec![
        president(),
        EntityDeclaration::new("Group")
            .attribute(AttributeDeclaration::new("cn", "STRING").naming())
            .attribute(AttributeDeclaration::new("members", "LIST<STRING>")),
    ];
    assert_eq!(build_schema(&declarations).unwrap(), build_schema(&declarations).unwrap());
}

#[test]
fn test_two_naming_attributes_fail() {
    let entity = president().attribute(AttributeDeclaration::new("email", TypeRef::String).naming());
    let err = build_schema(&[entity]).unwrap_err();
    assert_eq!(err.rule, SchemaRule::NamingAttribute);
    assert_eq!(err.entity, "President");
    assert!(err.message.contains("username, email"), "{}", err.message);
}

#[test]
fn test_zero_naming_attributes_fail() {
    let entity = EntityDeclaration::new("President")
        .attribute(AttributeDeclaration::new("firstName", TypeRef::String));
    assert_eq!(rule_of(&[entity]), SchemaRule::NamingAttribute);
}

#[test]
fn test_zero_attributes_fail() {
    assert_eq!(rule_of(&[EntityDeclaration::new("Empty")]), SchemaRule::HasAttributes);
}

#[test_case(EntityShape { is_abstract: true, ..Default::default() } ; "abstract")]
#[test_case(EntityShape { is_nested: true, ..Default::default() } ; "nested")]
#[test_case(EntityShape { requires_state: true, ..Default::default() } ; "requires state")]
fn test_non_constructible_fails(shape: EntityShape) {
    assert_eq!(rule_of(&[president().shape(shape)]), SchemaRule::Constructible);
}

#[test]
fn test_constructible_checked_before_attributes() {
    let entity = EntityDeclaration::new("Empty").shape(EntityShape {
        is_abstract: true,
        ..Default::default()
    });
    assert_eq!(rule_of(&[entity]), SchemaRule::Constructible);
}

#[test]
fn test_duplicate_attribute_names_fail() {
    let entity = president().attribute(AttributeDeclaration::new("FirstName", TypeRef::String));
    let err = build_schema(&[entity]).unwrap_err();
    assert_eq!(err.rule, SchemaRule::UniqueNames);
    assert_eq!(err.attribute.as_deref(), Some("FirstName"));
}

#[test]
fn test_duplicate_entity_names_fail() {
    let err = build_schema(&[president(), president()]).unwrap_err();
    assert_eq!(err.rule, SchemaRule::UniqueNames);
    assert!(err.attribute.is_none());
}

#[test_case("DATE" ; "unknown primitive")]
#[test_case("LIST<LIST<STRING>>" ; "nested list")]
#[test_case("LIST<OBJECT>" ; "list of unknown")]
fn test_unsupported_type_fails(type_name: &str) {
    let entity = president().attribute(AttributeDeclaration::new("extra", type_name));
    let err = build_schema(&[entity]).unwrap_err();
    assert_eq!(err.rule, SchemaRule::SupportedType);
    assert_eq!(err.attribute.as_deref(), Some("extra"));
}

#[test]
fn test_failure_produces_no_schema() {
    let declarations = vec![president(), EntityDeclaration::new("Broken")];
    assert!(build_schema(&declarations).is_err());
}

#[test]
fn test_inheritance_does_not_propagate() {
    // Unmarked subtype: not an entity at all
    let declarations = vec![
        president(),
        EntityDeclaration::unmarked("FormerPresident").extends("President"),
    ];
    let schema = build_schema(&declarations).unwrap();
    assert!(schema.entity("FormerPresident").is_none());

    // Marked subtype: gets only its own attributes
    let declarations = vec![
        president(),
        EntityDeclaration::new("VicePresident")
            .extends("President")
            .attribute(AttributeDeclaration::new("office", TypeRef::String).naming()),
    ];
    let schema = build_schema(&declarations).unwrap();
    let vp = schema.entity("VicePresident").unwrap();
    assert_eq!(vp.attributes().len(), 1);
    assert!(vp.attribute("username").is_none());

    // Marked subtype declaring nothing fails
    let declarations = vec![president(), EntityDeclaration::new("Acting").extends("President")];
    assert_eq!(rule_of(&declarations), SchemaRule::HasAttributes);
}

#[test]
fn test_error_display() {
    let err = build_schema(&[president().attribute(AttributeDeclaration::new("x", "DATE"))]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Schema authoring failed for entity 'President', attribute 'x': type 'DATE' is not supported [supported-type]"
    );

    let err: Error = err.into();
    assert!(err.is_fatal());
}

#[test]
fn test_type_ref_parse() {
    assert_eq!(TypeRef::from("string"), TypeRef::String);
    assert_eq!(TypeRef::from("LIST<Integer>"), TypeRef::list(TypeRef::Integer));
    assert_eq!(TypeRef::from("Map"), TypeRef::Unsupported("Map".into()));
    assert_eq!(TypeRef::list(TypeRef::Password).to_string(), "LIST<PASSWORD>");
}

// ============================================================================
// Loading
// ============================================================================

const PRESIDENTS_YAML: &str = r"
entities:
  - name: President
    attributes:
      - name: firstName
        type: STRING
        displayName: First Name
      - name: username
        type: STRING
        isNamingAttribute: true
      - name: termsServed
        type: INTEGER
        nullable: false
      - name: parties
        type: LIST<STRING>
  - name: Helper
    entity: false
  - name: Inner
    nested: true
    attributes:
      - name: id
        type: STRING
        isNamingAttribute: true
";

#[test]
fn test_load_from_yaml() {
    let declarations = load_entities_from_str(PRESIDENTS_YAML).unwrap();
    assert_eq!(declarations.len(), 3);
    assert!(!declarations[1].marked);
    assert!(declarations[2].shape.is_nested);
    assert_eq!(declarations[0].attributes[0].display_name.as_deref(), Some("First Name"));
    assert!(!declarations[0].attributes[2].nullable);

    // The nested type is marked, so the build fails on it
    let err = build_schema(&declarations).unwrap_err();
    assert_eq!(err.entity, "Inner");
    assert_eq!(err.rule, SchemaRule::Constructible);
}

#[test]
fn test_load_plain_list() {
    let yaml = r"
- name: Group
  attributes:
    - name: cn
      type: STRING
      isNamingAttribute: true
";
    let declarations = load_entities_from_str(yaml).unwrap();
    assert_eq!(build_schema(&declarations).unwrap().len(), 1);
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    file.write_all(PRESIDENTS_YAML.as_bytes()).unwrap();
    assert_eq!(load_entities_from_file(file.path()).unwrap().len(), 3);

    let err = load_entities_from_file("/nonexistent/entities.yaml").unwrap_err();
    assert!(matches!(err, Error::FileNotFound { .. }));
}

// ============================================================================
// Mapping
// ============================================================================

fn presidents_schema() -> SchemaDefinition {
    let declarations: Vec<_> = load_entities_from_str(PRESIDENTS_YAML)
        .unwrap()
        .into_iter()
        .filter(|d| d.name != "Inner")
        .collect();
    build_schema(&declarations).unwrap()
}

#[test]
fn test_to_entry() {
    let schema = presidents_schema();
    let entity = schema.entity("President").unwrap();
    let parent = Dn::parse("o=pennaveiam").unwrap();

    let entry = entity
        .to_entry(
            &json!({
                "username": "washington",
                "firstName": null,
                "termsServed": 2,
                "parties": ["Independent", "Federalist-leaning"],
                "ignored": {"nested": true}
            }),
            &parent,
        )
        .unwrap();

    assert_eq!(entry.dn().to_string(), "username=washington,o=pennaveiam");
    assert!(!entry.has("firstName"));
    assert!(!entry.has("ignored"));
    assert_eq!(entry.get("parties").unwrap().len(), 2);
    assert_eq!(entry.first("termsServed").unwrap().to_string(), "2");
}

#[test_case(json!({"termsServed": 1}) ; "missing naming attribute")]
#[test_case(json!({"username": null, "termsServed": 1}) ; "null naming attribute")]
#[test_case(json!({"username": "adams"}) ; "non nullable missing")]
#[test_case(json!({"username": "adams", "termsServed": 1.5}) ; "integer with fraction")]
#[test_case(json!({"username": "adams", "termsServed": 1, "parties": "Federalist"}) ; "scalar for list")]
#[test_case(json!({"username": 7, "termsServed": 1}) ; "number for string")]
#[test_case(json!(["adams"]) ; "not an object")]
fn test_to_entry_rejects(instance: serde_json::Value) {
    let schema = presidents_schema();
    let entity = schema.entity("President").unwrap();
    let err = entity.to_entry(&instance, &Dn::root()).unwrap_err();
    assert!(matches!(err, Error::Mapping { .. }), "{err}");
}

#[test]
fn test_to_property_sets() {
    let schema = presidents_schema();
    let sets = schema.to_property_sets();
    assert_eq!(sets.len(), 2);

    let catalog = sets.iter().find(|s| s.name() == SCHEMA_CATALOG).unwrap();
    assert_eq!(
        catalog.get_list("President").unwrap(),
        &["firstName", "username", "termsServed", "parties"]
    );

    let keys = sets.iter().find(|s| s.name() == PRIMARY_KEY_ATTRIBUTES).unwrap();
    assert_eq!(keys.get_str("President"), Some("username"));
}

#[test]
fn test_to_json() {
    let json = presidents_schema().to_json().unwrap();
    assert_eq!(json["entities"][0]["name"], "President");
    assert_eq!(json["entities"][0]["attributes"][1]["isNamingAttribute"], true);
    assert_eq!(json["entities"][0]["attributes"][3]["type"], "LIST<STRING>");
}
