//! Snapshot tests for LDAP filter generation.
//!
//! These tests use insta to capture the rendered filters and detect
//! unexpected changes in output.
//!
//! Run with: cargo test -p adgate-filter

use adgate_filter::{FilterError, FilterNode, parse, parse_str};
use insta::assert_snapshot;
use serde_json::json;

fn compile(document: &serde_json::Value) -> String {
    let node = parse(document).unwrap();
    let rendered = node.render();
    assert_eq!(rendered.len(), node.rendered_len());
    rendered
}

// =============================================================================
// Literal attributes
// =============================================================================

#[test]
fn snapshot_literal_string() {
    assert_snapshot!(compile(&json!({"cn": "bob"})), @"(&(cn=bob))");
}

#[test]
fn snapshot_literal_null() {
    assert_snapshot!(compile(&json!({"cn": null})), @"(&(!(cn=*)))");
}

#[test]
fn snapshot_literal_bool_and_number() {
    assert_snapshot!(
        compile(&json!({"and": {"isCriticalSystemObject": true, "logonCount": 0}})),
        @"(&(isCriticalSystemObject=True)(logonCount=0))"
    );
}

// =============================================================================
// Logical groups
// =============================================================================

#[test]
fn snapshot_and() {
    assert_snapshot!(
        compile(&json!({"and": {"cn": "bob", "sn": "smith"}})),
        @"(&(cn=bob)(sn=smith))"
    );
}

#[test]
fn snapshot_or() {
    assert_snapshot!(
        compile(&json!({"or": [{"cn": "a"}, {"cn": "b"}]})),
        @"(|(cn=a)(cn=b))"
    );
}

#[test]
fn snapshot_not() {
    assert_snapshot!(compile(&json!({"not": {"cn": "a"}})), @"(!(cn=a))");
}

#[test]
fn snapshot_not_multiple_properties() {
    assert_snapshot!(
        compile(&json!({"not": {"cn": "a", "sn": "b"}})),
        @"(&(!(cn=a))(!(sn=b)))"
    );
}

#[test]
fn snapshot_nor() {
    assert_snapshot!(
        compile(&json!({"nor": [{"cn": "a"}, {"mail": null}]})),
        @"(&(!(cn=a))(!(!(mail=*))))"
    );
}

// =============================================================================
// Active Directory extensible matches
// =============================================================================

#[test]
fn snapshot_band() {
    assert_snapshot!(
        compile(&json!({"band": {"userAccountControl": 2}})),
        @"(userAccountControl:1.2.840.113556.1.4.803:=2)"
    );
}

#[test]
fn snapshot_bor() {
    assert_snapshot!(
        compile(&json!({"bor": {"groupType": 6}})),
        @"(groupType:1.2.840.113556.1.4.804:=6)"
    );
}

#[test]
fn snapshot_recurse() {
    assert_snapshot!(
        compile(&json!({"recurse": {"memberOf": "CN=Domain Admins,CN=Users,DC=corp,DC=local"}})),
        @"(memberOf:1.2.840.113556.1.4.1941:=CN=Domain Admins,CN=Users,DC=corp,DC=local)"
    );
}

// =============================================================================
// Realistic gateway queries
// =============================================================================

#[test]
fn snapshot_enabled_admins() {
    assert_snapshot!(
        compile(&json!({"and": {
            "objectCategory": "person",
            "objectClass": "user",
            "recurse": {"memberOf": "CN=Domain Admins,CN=Users,DC=corp,DC=local"},
            "not": {"band": {"userAccountControl": 2}}
        }})),
        @"(&(objectCategory=person)(objectClass=user)(memberOf:1.2.840.113556.1.4.1941:=CN=Domain Admins,CN=Users,DC=corp,DC=local)(!(userAccountControl:1.2.840.113556.1.4.803:=2)))"
    );
}

#[test]
fn snapshot_accounts_without_mail_in_departments() {
    assert_snapshot!(
        compile(&json!({"and": {
            "mail": null,
            "or": [{"department": "Sales"}, {"department": "Support"}],
            "nor": [{"title": "Contractor"}, {"bor": {"userAccountControl": 34}}]
        }})),
        @"(&(!(mail=*))(|(department=Sales)(department=Support))(&(!(title=Contractor))(userAccountControl:1.2.840.113556.1.4.804:=34)))"
    );
}

#[test]
fn snapshot_scoped_by_collaborator() {
    let caller = parse_str(r#"{"or": [{"sAMAccountName": "jdoe"}, {"mail": "jdoe@corp.local"}]}"#)
        .unwrap();
    let scoped = caller.and_with(FilterNode::equal("objectClass", "user").unwrap());
    assert_snapshot!(
        scoped.render(),
        @"(&(|(sAMAccountName=jdoe)(mail=jdoe@corp.local))(objectClass=user))"
    );
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn snapshot_error_messages() {
    let err = parse(&json!({"and": "not-an-object"})).unwrap_err();
    assert_snapshot!(err.to_string(), @"Invalid 'and' filter: expected an object of attribute tests");

    let err = parse(&json!({"or": {"cn": "a"}})).unwrap_err();
    assert_snapshot!(err.to_string(), @"Invalid 'or' filter: expected an array of objects");

    let err = parse(&json!({"band": {"a": 1, "b": 2}})).unwrap_err();
    assert_snapshot!(err.to_string(), @"Invalid 'band' filter: expected an object with exactly one property");

    let err = parse(&json!({"band": {"userAccountControl": "disabled"}})).unwrap_err();
    assert_snapshot!(err.to_string(), @"Invalid value for 'userAccountControl' in 'band' filter: expected a 64-bit integer");

    let err = parse(&json!({"nor": [{"or": []}]})).unwrap_err();
    assert_eq!(
        err,
        FilterError::InvalidChild {
            parent: adgate_filter::FilterKind::Nor,
            child: adgate_filter::FilterKind::Or,
        }
    );
}

#[test]
fn snapshot_json_write_back() {
    let node = parse(&json!({"and": {
        "objectClass": "user",
        "not": {"cn": "a", "sn": "b"},
        "recurse": {"memberOf": "CN=G,DC=corp"}
    }}))
    .unwrap();
    assert_snapshot!(
        serde_json::to_string(&node).unwrap(),
        @r#"{"and":{"objectClass":"user","nor":[{"cn":"a"},{"sn":"b"}],"recurse":{"memberOf":"CN=G,DC=corp"}}}"#
    );
}
