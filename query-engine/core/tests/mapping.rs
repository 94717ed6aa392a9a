use indoc::indoc;
use pretty_assertions::assert_eq;
use query_core::{
    CursorAttribute, CursorField, FieldMapping, Mapping, QueryEngine, Schema, SchemaRef, Severity, Value,
    ValueField, ValueMapping, ValueRoot,
};
use serde_json::json;
use std::sync::Arc;

fn schema() -> SchemaRef {
    Arc::new(
        Schema::parse(indoc! {r#"
            scalar Date

            type Query {
              user: User!
              admin: User!
            }

            type User {
              name: String!
              greeting: String!
              joined: Date
              manager: User
            }
        "#})
        .unwrap(),
    )
}

fn greeting() -> FieldMapping<ValueField> {
    FieldMapping::CursorField(CursorField::new("greeting", vec!["name".into()], |cursor| {
        let name = cursor.field("name")?.as_leaf()?;
        Ok(Value::from(format!("Hello, {}!", name.as_str().unwrap_or_default())))
    }))
}

fn prefixed_engine() -> QueryEngine {
    let user = json!({
        "name": "ann",
        "displayName": "Ann",
        "manager": { "name": "bob", "displayName": "Bob", "manager": null },
    });

    let admin = json!({ "name": "root", "displayName": "Root", "manager": null });

    let mapping = ValueMapping::builder(schema())
        .object(
            "Query",
            vec![ValueRoot::mapping("user", user), ValueRoot::mapping("admin", admin)],
        )
        .prefixed(
            "User",
            vec![
                (vec![], vec![ValueField::value("name"), ValueField::value("manager"), greeting()]),
                (
                    vec!["admin".to_owned()],
                    vec![ValueField::key("name", "displayName"), ValueField::value("manager"), greeting()],
                ),
                (
                    vec!["user".to_owned(), "manager".to_owned()],
                    vec![ValueField::key("name", "displayName"), ValueField::value("manager"), greeting()],
                ),
                (
                    vec!["admin".to_owned()],
                    vec![ValueField::value("name"), ValueField::value("manager"), greeting()],
                ),
            ],
        )
        .build();

    QueryEngine::new(Arc::new(mapping)).unwrap()
}

#[test]
fn prefixed_mappings_pick_the_longest_matching_prefix() {
    let result = prefixed_engine().compile_and_run_blocking(
        "{ user { name manager { name } } admin { name } }",
        None,
        None,
        true,
    );

    assert_eq!(
        result,
        json!({
            "data": {
                "user": { "name": "ann", "manager": { "name": "Bob" } },
                "admin": { "name": "Root" },
            }
        })
    );
}

#[test]
fn cursor_fields_compute_from_their_siblings() {
    let result = prefixed_engine().compile_and_run_blocking("{ user { greeting } admin { greeting } }", None, None, true);

    assert_eq!(
        result,
        json!({ "data": { "user": { "greeting": "Hello, ann!" }, "admin": { "greeting": "Hello, Root!" } } })
    );
}

#[test]
fn validation_reports_structural_mismatches() {
    let mapping = ValueMapping::builder(schema())
        .object("Query", vec![ValueRoot::mapping("user", json!({}))])
        .object(
            "User",
            vec![
                ValueField::value("name"),
                ValueField::value("nickname"),
                FieldMapping::CursorAttribute(CursorAttribute::new("initials", vec!["fullName".into()], |_| {
                    Ok(Value::Null)
                })),
            ],
        )
        .object("Organisation", vec![])
        .build();

    let findings = mapping.validate();
    let messages: Vec<(Severity, &str)> = findings.iter().map(|f| (f.severity, f.message.as_str())).collect();

    assert_eq!(
        messages,
        vec![
            (Severity::Error, "Referenced field 'nickname' does not exist in type 'User'"),
            (
                Severity::Error,
                "Field 'initials' of type 'User' requires 'fullName' which is not mapped"
            ),
            (Severity::Error, "Referenced type 'Organisation' does not exist"),
            (Severity::Warning, "Custom scalar 'Date' has no leaf mapping"),
        ]
    );
}

#[test]
fn leaf_mappings_encode_custom_scalars() {
    let mapping = ValueMapping::builder(schema())
        .leaf("Date", |value| {
            let day = value.as_str().unwrap_or_default();
            Ok(json!(format!("{day}T00:00:00Z")))
        })
        .build();

    assert_eq!(
        mapping.encode_leaf("Date", &Value::from("2024-01-31")).unwrap(),
        json!("2024-01-31T00:00:00Z")
    );
    assert_eq!(mapping.encode_leaf("Date", &Value::Null).unwrap(), json!(null));
    assert_eq!(mapping.encode_leaf("String", &Value::from("x")).unwrap(), json!("x"));
}

#[test]
fn missing_root_mappings_are_runtime_problems() {
    let mapping = ValueMapping::builder(schema())
        .object("Query", vec![ValueRoot::mapping("user", json!({ "name": "ann" }))])
        .object("User", ValueField::values(["name"]))
        .build();

    let engine = QueryEngine::new(Arc::new(mapping)).unwrap();
    let result = engine.compile_and_run_blocking("{ user { name } admin { name } }", None, None, true);

    assert_eq!(
        result,
        json!({
            "data": { "user": { "name": "ann" }, "admin": null },
            "errors": [{ "message": "No root mapping for field 'admin'", "path": ["admin"] }],
        })
    );
}
