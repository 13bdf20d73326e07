//! Tests for the filter module

use super::*;
use crate::error::Error;
use crate::ldap::{Dn, Entry, EntryValue};
use pretty_assertions::assert_eq;
use serde_json::json;
use test_case::test_case;

fn president(username: &str, terms: i64) -> Entry {
    let dn = Dn::parse(&format!("username={username},o=pennaveiam")).unwrap();
    Entry::from_json(
        dn,
        &json!({
            "username": username,
            "firstName": "John Quincy",
            "termsServed": terms,
            "alive": false,
            "mail": ["first@example.com", "second@example.com"]
        }),
    )
    .unwrap()
}

fn eval(filter: &str, entry: &Entry) -> bool {
    Filter::parse(filter).unwrap().matches(entry)
}

// ============================================================================
// Parsing
// ============================================================================

#[test]
fn test_parse_nested() {
    let filter = Filter::parse("(&(username=washington)(!(termsServed<=0)))").unwrap();
    let Filter::And(children) = &filter else {
        panic!("expected And, got {filter:?}");
    };
    assert_eq!(children.len(), 2);
    assert_eq!(children[0].attribute(), Some("username"));
    assert!(matches!(&children[1], Filter::Not(inner) if matches!(**inner, Filter::LessOrEqual { .. })));
}

#[test]
fn test_parse_leaf_kinds() {
    assert!(matches!(Filter::parse("(cn=*)").unwrap(), Filter::Present { .. }));
    assert!(matches!(Filter::parse("(cn~=jon)").unwrap(), Filter::Approx { .. }));
    assert!(matches!(Filter::parse("(age>=3)").unwrap(), Filter::GreaterOrEqual { .. }));
    assert!(matches!(Filter::parse("(cn=a*b)").unwrap(), Filter::Substring { .. }));
    assert!(matches!(Filter::parse("(2.5.4.3=x)").unwrap(), Filter::Equality { .. }));
    assert!(matches!(Filter::parse("(cn;lang-en=x)").unwrap(), Filter::Equality { .. }));
}

#[test]
fn test_parse_substring_components() {
    let filter = Filter::parse("(cn=jo*n q*cy*)").unwrap();
    let Filter::Substring { substrings, .. } = filter else {
        panic!("expected substring filter");
    };
    assert_eq!(substrings.initial.unwrap().original(), "jo");
    let any: Vec<_> = substrings.any.iter().map(AssertionValue::original).collect();
    assert_eq!(any, vec!["n q", "cy"]);
    assert!(substrings.final_value.is_none());
}

#[test_case("" ; "empty input")]
#[test_case("()" ; "empty expression")]
#[test_case("(&)" ; "empty and")]
#[test_case("(|)" ; "empty or")]
#[test_case("(cn=a" ; "missing close paren")]
#[test_case("(&(cn=a)" ; "unbalanced and")]
#[test_case("(cn=a))" ; "trailing paren")]
#[test_case("cn=a" ; "missing parens")]
#[test_case("(=a)" ; "missing attribute")]
#[test_case("(c_n=a)" ; "bad attribute character")]
#[test_case("(1cn=a)" ; "attribute starts with digit")]
#[test_case("(1.02.3=a)" ; "oid leading zero")]
#[test_case("(cn;=a)" ; "empty option")]
#[test_case("(cn)" ; "missing operator")]
#[test_case("(cn:dn:=a)" ; "extensible match")]
#[test_case("(cn=a(b)" ; "unescaped open paren")]
#[test_case("(cn=a\\2)" ; "short escape")]
#[test_case("(cn=a\\zz)" ; "non hex escape")]
#[test_case("(cn>=a*)" ; "star in ordering value")]
#[test_case("(cn=a**b)" ; "empty substring component")]
#[test_case("(!(a=b)(c=d))" ; "not with two children")]
fn test_parse_rejects(input: &str) {
    let err = Filter::parse(input).unwrap_err();
    assert!(matches!(err, Error::FilterSyntax { .. }), "{input}: {err}");
}

#[test]
fn test_error_reports_offset() {
    let err = Filter::parse("(&(cn=a)(sn=b\\q1))").unwrap_err();
    match err {
        Error::FilterSyntax { position, .. } => assert_eq!(position, 13),
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn test_deep_nesting_rejected() {
    let input = format!("{}(cn=a){}", "(!".repeat(100), ")".repeat(100));
    assert!(Filter::parse(&input).is_err());
}

// ============================================================================
// Assertion values and round trip
// ============================================================================

#[test]
fn test_assertion_value_keeps_original() {
    let filter = Filter::parse("(cn=  Hello\\2aWorld  )").unwrap();
    let Filter::Equality { value, .. } = &filter else {
        panic!("expected equality");
    };
    assert_eq!(value.original(), "  Hello\\2aWorld  ");
    assert_eq!(value.assertion_value(), b"  Hello*World  ");
    assert_eq!(value.normalized(), "hello*world");
}

#[test]
fn test_binary_escapes_decode() {
    let filter = Filter::parse("(objectGUID=\\00\\ff\\28)").unwrap();
    let Filter::Equality { value, .. } = &filter else {
        panic!("expected equality");
    };
    assert_eq!(value.assertion_value(), &[0x00, 0xff, 0x28]);
    assert!(value.as_str().is_none());
    assert_eq!(filter.to_canonical_string(), "(objectGUID=\\00\\ff\\28)");
}

#[test_case("(&(username=washington)(!(termsServed<=0)))")]
#[test_case("(|(cn=a)(cn=b)(cn=c))")]
#[test_case("(cn=Jo*n Q*cy*)")]
#[test_case("(cn=*Adams)")]
#[test_case("(cn~=Jon)")]
#[test_case("(description=50\\2A off \\28today\\29)")]
#[test_case("(cn=caf\u{e9})")]
#[test_case("(sn=  spaced   out )")]
fn test_display_round_trip(input: &str) {
    let filter = Filter::parse(input).unwrap();
    assert_eq!(filter.to_string(), input);
    assert_eq!(Filter::parse(&filter.to_string()).unwrap(), filter);
}

#[test]
fn test_canonical_string_reescapes() {
    let filter = Filter::parse("(cn=\\41bc\\2A)").unwrap();
    assert_eq!(filter.to_string(), "(cn=\\41bc\\2A)");
    assert_eq!(filter.to_canonical_string(), "(cn=Abc\\2a)");
}

#[test]
fn test_programmatic_filters() {
    let filter = Filter::and(vec![
        Filter::equality("cn", "a(b)*"),
        Filter::not(Filter::present("mail")),
        Filter::or(vec![Filter::equality("sn", "x")]),
    ]);
    assert_eq!(filter.to_string(), "(&(cn=a\\28b\\29\\2a)(!(mail=*))(|(sn=x)))");
    assert_eq!(Filter::parse(&filter.to_string()).unwrap(), filter);
}

#[test]
fn test_escape_value() {
    assert_eq!(escape_value(b"a*b"), "a\\2ab");
    assert_eq!(escape_value(b"(x)\\"), "\\28x\\29\\5c");
    assert_eq!(escape_value(b"\0"), "\\00");
    assert_eq!(escape_value("caf\u{e9}".as_bytes()), "caf\u{e9}");
    assert_eq!(escape_value(&[0x61, 0xff]), "a\\ff");
}

// ============================================================================
// Evaluation
// ============================================================================

#[test]
fn test_documented_example() {
    let filter = "(&(username=washington)(!(termsServed<=0)))";
    assert!(eval(filter, &president("washington", 2)));
    assert!(!eval(filter, &president("adams", 1)));
}

#[test_case("(username=WASHINGTON)", true ; "equality ignores case")]
#[test_case("(firstName=john   quincy)", true ; "equality folds spaces")]
#[test_case("(termsServed=2)", true ; "numeric equality")]
#[test_case("(termsServed=2.0)", true ; "numeric equality decimal")]
#[test_case("(termsServed=two)", false ; "non numeric assertion")]
#[test_case("(termsServed>=10)", false ; "numeric not lexicographic")]
#[test_case("(termsServed<=10)", true ; "numeric less or equal")]
#[test_case("(username>=w)", true ; "string greater or equal")]
#[test_case("(username<=a)", false ; "string less or equal")]
#[test_case("(alive=FALSE)", true ; "boolean equality")]
#[test_case("(alive>=false)", false ; "boolean has no ordering")]
#[test_case("(mail=second@example.com)", true ; "any value of multi valued")]
#[test_case("(mail=*)", true ; "presence")]
#[test_case("(phone=*)", false ; "absent attribute")]
#[test_case("(USERNAME=washington)", true ; "attribute name ignores case")]
#[test_case("(username;lang-en=washington)", true ; "options ignored")]
#[test_case("(username=wash*)", true ; "substring initial")]
#[test_case("(username=*ton)", true ; "substring final")]
#[test_case("(username=w*shi*ton)", true ; "substring any")]
#[test_case("(username=*ash*ing*)", true ; "substring ordered any")]
#[test_case("(username=*ing*ash*)", false ; "substring wrong order")]
#[test_case("(username=washington*ton)", false ; "substring overlap")]
#[test_case("(firstName=*n q*)", true ; "substring keeps inner space")]
#[test_case("(termsServed=*2)", true ; "substring on number")]
#[test_case("(username~=washingtn)", true ; "approx one deletion")]
#[test_case("(username~=Washing-ton)", true ; "approx punctuation")]
#[test_case("(username~=jefferson)", false ; "approx unrelated")]
#[test_case("(|(username=adams)(termsServed>=2))", true ; "or")]
#[test_case("(&(username=adams)(termsServed>=2))", false ; "and")]
fn test_evaluate(filter: &str, expected: bool) {
    assert_eq!(eval(filter, &president("washington", 2)), expected, "{filter}");
}

#[test]
fn test_binary_values() {
    let mut entry = Entry::new(Dn::parse("cn=x").unwrap());
    entry.add_values("objectGUID", vec![EntryValue::Binary(vec![0x00, 0xff, 0x28, 0x29])]);

    assert!(eval("(objectGUID=\\00\\ff\\28\\29)", &entry));
    assert!(eval("(objectGUID=\\00*\\29)", &entry));
    assert!(!eval("(objectGUID=\\00\\fe*)", &entry));
    assert!(eval("(objectGUID>=\\00)", &entry));
}

#[test]
fn test_evaluate_function() {
    let filter = Filter::present("username");
    assert!(evaluate(&filter, &president("adams", 1)));
}
