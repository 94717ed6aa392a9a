use indoc::indoc;
use pretty_assertions::assert_eq;
use query_core::{
    query_structure::{Predicate, Query, Select, Term},
    CoreError, CoreResult, QueryEngine, Schema, ValueField, ValueMapping, ValueRoot,
};
use serde_json::{json, Value as Json};
use std::sync::Arc;

fn items_engine() -> QueryEngine {
    let schema = Schema::parse(indoc! {r#"
        type Query {
          collection: Collection!
        }

        type Collection {
          items: [Item!]!
        }

        union Item = ItemA | ItemB

        type ItemA {
          itema: String!
        }

        type ItemB {
          itemb: String!
        }
    "#})
    .unwrap();

    let collection = json!({
        "items": [
            { "__typename": "ItemA", "itema": "A" },
            { "__typename": "ItemB", "itemb": "B" },
        ]
    });

    let mapping = ValueMapping::builder(Arc::new(schema))
        .object("Query", vec![ValueRoot::mapping("collection", collection)])
        .object("Collection", ValueField::values(["items"]))
        .object("ItemA", ValueField::values(["itema"]))
        .object("ItemB", ValueField::values(["itemb"]))
        .build();

    QueryEngine::new(Arc::new(mapping)).unwrap()
}

fn characters_engine() -> QueryEngine {
    let schema = Schema::parse(indoc! {r#"
        type Query {
          character(id: ID!): Character
          hero: Character!
          characters(limit: Int): [Character!]!
        }

        enum Episode {
          NEWHOPE
          EMPIRE
          JEDI
        }

        interface Character {
          id: ID!
          name: String
        }

        type Human implements Character {
          id: ID!
          name: String
          homePlanet: String
        }

        type Droid implements Character {
          id: ID!
          name: String
          primaryFunction: String
          appearsIn: [Episode!]!
        }
    "#})
    .unwrap();

    let characters = json!([
        { "__typename": "Human", "key": "1000", "name": "Luke Skywalker", "homePlanet": "Tatooine" },
        { "__typename": "Droid", "key": "2001", "name": "R2-D2", "primaryFunction": "Astromech", "appearsIn": ["NEWHOPE", "JEDI"] },
        { "__typename": "Human", "key": "1003", "name": null, "homePlanet": null },
        { "__typename": "Droid", "key": "2001", "name": "R2-D2 (duplicate)", "primaryFunction": null, "appearsIn": [] },
    ]);

    let by_id = |select: &Select| -> CoreResult<Query> {
        let id = select.binding("id").cloned().unwrap_or_default();
        let child = Query::unique(Query::filter(Predicate::eql(Term::field("id"), id), (*select.child).clone()));

        Ok(Query::Select(select.clone().with_child(child)))
    };

    let limited = |select: &Select| -> CoreResult<Query> {
        let child = (*select.child).clone();

        let child = match select.binding("limit").filter(|limit| !limit.is_empty()) {
            None => child,
            Some(limit) => match limit.as_int() {
                Some(n) if n >= 0 => Query::Limit(n as usize, Box::new(child)),
                _ => return Err(CoreError::elaboration("'limit' must not be negative")),
            },
        };

        Ok(Query::Select(select.clone().with_child(child)))
    };

    let mapping = ValueMapping::builder(Arc::new(schema))
        .object(
            "Query",
            vec![
                ValueRoot::mapping("character", characters.clone()),
                ValueRoot::mapping("hero", characters[1].clone()),
                ValueRoot::mapping("characters", characters),
            ],
        )
        .object(
            "Character",
            vec![ValueField::key("id", "key"), ValueField::value("name")],
        )
        .object("Human", ValueField::values(["homePlanet"]))
        .object("Droid", ValueField::values(["primaryFunction", "appearsIn"]))
        .select_elaborator("Query", "character", by_id)
        .select_elaborator("Query", "characters", limited)
        .build();

    QueryEngine::new(Arc::new(mapping)).unwrap()
}

fn run(engine: &QueryEngine, query: &str) -> Json {
    engine.compile_and_run_blocking(query, None, None, true)
}

#[test]
fn each_union_member_is_evaluated_against_its_fragment() {
    let result = run(
        &items_engine(),
        "{ collection { items { ... on ItemA { itema } ... on ItemB { itemb } } } }",
    );

    assert_eq!(
        result,
        json!({ "data": { "collection": { "items": [{ "itema": "A" }, { "itemb": "B" }] } } })
    );
}

#[test]
fn unrequested_union_members_are_empty_objects() {
    let result = run(&items_engine(), "{ collection { items { ... on ItemA { itema } } } }");

    assert_eq!(
        result,
        json!({ "data": { "collection": { "items": [{ "itema": "A" }, {}] } } })
    );
}

#[test]
fn typename_is_the_concrete_type() {
    let result = run(
        &items_engine(),
        indoc! {r#"
            {
              collection {
                items {
                  ... on ItemA { __typename itema }
                  ... on ItemB { __typename itemb }
                }
              }
            }
        "#},
    );

    assert_eq!(
        result,
        json!({
            "data": {
                "collection": {
                    "items": [
                        { "__typename": "ItemA", "itema": "A" },
                        { "__typename": "ItemB", "itemb": "B" },
                    ]
                }
            }
        })
    );
}

#[test]
fn interface_fields_resolve_through_the_interface_mapping() {
    let result = run(
        &characters_engine(),
        indoc! {r#"
            query {
              hero {
                id
                name
                __typename
                ... on Droid { primaryFunction appearsIn }
                ... on Human { homePlanet }
              }
            }
        "#},
    );

    assert_eq!(
        result,
        json!({
            "data": {
                "hero": {
                    "id": "2001",
                    "name": "R2-D2",
                    "__typename": "Droid",
                    "primaryFunction": "Astromech",
                    "appearsIn": ["NEWHOPE", "JEDI"],
                }
            }
        })
    );
}

#[test]
fn unique_selects_a_single_element() {
    let result = run(&characters_engine(), r#"{ character(id: "1000") { name } }"#);

    assert_eq!(result, json!({ "data": { "character": { "name": "Luke Skywalker" } } }));
}

#[test]
fn unique_without_match_is_null_for_nullable_fields() {
    let result = run(&characters_engine(), r#"{ character(id: "9999") { name } }"#);

    assert_eq!(result, json!({ "data": { "character": null } }));
}

#[test]
fn unique_with_several_matches_is_a_problem_for_that_field_only() {
    let result = run(
        &characters_engine(),
        r#"{ character(id: "2001") { name } hero { name } }"#,
    );

    assert_eq!(
        result,
        json!({
            "data": { "character": null, "hero": { "name": "R2-D2" } },
            "errors": [{
                "message": "Expected a single result for field 'character', found 2",
                "path": ["character"],
            }],
        })
    );
}

#[test]
fn aliases_become_response_keys() {
    let result = run(
        &characters_engine(),
        r#"{ luke: character(id: "1000") { nom: name } nobody: character(id: "1003") { name } }"#,
    );

    assert_eq!(
        result,
        json!({ "data": { "luke": { "nom": "Luke Skywalker" }, "nobody": { "name": null } } })
    );
}

#[test]
fn select_elaborators_turn_arguments_into_list_operations() {
    let result = run(&characters_engine(), "{ characters(limit: 2) { id } }");

    assert_eq!(
        result,
        json!({ "data": { "characters": [{ "id": "1000" }, { "id": "2001" }] } })
    );
}

#[test]
fn unknown_fields_drop_only_their_branch() {
    let result = run(&characters_engine(), "{ hero { name } villain { name } }");

    assert_eq!(
        result,
        json!({
            "data": { "hero": { "name": "R2-D2" } },
            "errors": [{ "message": "Unknown field 'villain' in select on type 'Query'" }],
        })
    );
}

#[test]
fn failed_compiles_have_no_data() {
    let result = run(&characters_engine(), "{ villain { name } }");

    assert_eq!(
        result,
        json!({ "errors": [{ "message": "Unknown field 'villain' in select on type 'Query'" }] })
    );
}

#[test]
fn variables_are_bound_before_elaboration() {
    let engine = characters_engine();
    let variables = json!({ "id": "1000" });

    let result = engine.compile_and_run_blocking(
        "query Character($id: ID!) { character(id: $id) { name } }",
        Some("Character"),
        Some(&variables),
        true,
    );

    assert_eq!(result, json!({ "data": { "character": { "name": "Luke Skywalker" } } }));
}

#[tokio::test]
async fn independent_roots_run_concurrently() {
    let engine = characters_engine();
    let result = engine
        .compile_and_run("{ hero { id } characters(limit: 1) { name } }", None, None, true)
        .await;

    assert_eq!(
        result,
        json!({ "data": { "hero": { "id": "2001" }, "characters": [{ "name": "Luke Skywalker" }] } })
    );
}
