use indoc::indoc;
use pretty_assertions::assert_eq;
use query_core::{
    query_structure::{Predicate, Query, Select, Term},
    CoreResult, QueryEngine, Schema,
};
use serde_json::{json, Value as Json};
use sql_query_connector::{
    ColumnRef, NoopMonitor, Queryable, SqlField, SqlMappingBuilder, SqlMonitor, SqlStatsMonitor, Sqlite,
};
use std::sync::Arc;

const SCHEMA: &str = indoc! {r#"
    type Query {
      characters: [Character!]!
      character(id: ID!): Character
      items: [Item!]!
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
    }

    union Item = Sword | Shield

    type Sword {
      id: Int!
      damage: Int!
    }

    type Shield {
      id: Int!
      armor: Int!
    }
"#};

const SEED: &str = indoc! {r#"
    CREATE TABLE character (id TEXT PRIMARY KEY, kind INTEGER NOT NULL, name TEXT, home_planet TEXT, primary_function TEXT);
    CREATE TABLE item (id INTEGER PRIMARY KEY, kind TEXT NOT NULL, damage INTEGER, armor INTEGER);

    INSERT INTO character VALUES
      ('1000', 1, 'Luke Skywalker', 'Tatooine', NULL),
      ('1003', 1, 'Leia Organa', 'Alderaan', NULL),
      ('2001', 2, 'R2-D2', NULL, 'Astromech');

    INSERT INTO item VALUES
      (1, 'sword', 10, NULL),
      (2, 'shield', NULL, 5),
      (3, 'sword', 7, NULL);
"#};

fn col(table: &str, column: &str) -> ColumnRef {
    ColumnRef::new(table, column)
}

fn by_id(select: &Select) -> CoreResult<Query> {
    let id = select.binding("id").cloned().unwrap_or_default();
    let child = Query::unique(Query::filter(Predicate::eql(Term::field("id"), id), (*select.child).clone()));

    Ok(Query::Select(select.clone().with_child(child)))
}

async fn engine(monitor: Arc<dyn SqlMonitor>) -> QueryEngine {
    let database = Sqlite::new_in_memory().unwrap();
    database.raw_cmd(SEED).await.unwrap();

    let schema = Arc::new(Schema::parse(SCHEMA).unwrap());
    let builder = SqlMappingBuilder::new(schema, Arc::new(database)).monitor(monitor);
    let roots = vec![builder.root("characters"), builder.root("character"), builder.root("items")];

    let mapping = builder
        .object("Query", roots)
        .object(
            "Character",
            vec![
                SqlField::key("id", col("character", "id")),
                SqlField::column("name", col("character", "name")),
                SqlField::discriminator(col("character", "kind"), [(1, "Human"), (2, "Droid")]),
            ],
        )
        .object("Human", vec![SqlField::column("homePlanet", col("character", "home_planet"))])
        .object(
            "Droid",
            vec![SqlField::column("primaryFunction", col("character", "primary_function"))],
        )
        .object(
            "Item",
            vec![
                SqlField::hidden_key("id", col("item", "id")),
                SqlField::discriminator(col("item", "kind"), [("sword", "Sword"), ("shield", "Shield")]),
            ],
        )
        .object(
            "Sword",
            vec![
                SqlField::key("id", col("item", "id")),
                SqlField::column("damage", col("item", "damage")),
            ],
        )
        .object(
            "Shield",
            vec![
                SqlField::key("id", col("item", "id")),
                SqlField::column("armor", col("item", "armor")),
            ],
        )
        .select_elaborator("Query", "character", by_id)
        .build();

    QueryEngine::new(Arc::new(mapping)).unwrap()
}

async fn run(query: &str) -> Json {
    engine(Arc::new(NoopMonitor)).await.compile_and_run(query, None, None, true).await
}

#[tokio::test]
async fn interfaces_resolve_their_concrete_type_from_the_discriminator() {
    let result = run(indoc! {r#"
        {
          characters {
            __typename
            name
            ... on Human { homePlanet }
            ... on Droid { primaryFunction }
          }
        }
    "#})
    .await;

    assert_eq!(
        result,
        json!({
            "data": {
                "characters": [
                    { "__typename": "Human", "name": "Luke Skywalker", "homePlanet": "Tatooine" },
                    { "__typename": "Human", "name": "Leia Organa", "homePlanet": "Alderaan" },
                    { "__typename": "Droid", "name": "R2-D2", "primaryFunction": "Astromech" },
                ]
            }
        })
    );
}

#[tokio::test]
async fn ids_are_read_from_text_columns() {
    let result = run(r#"{ character(id: "2001") { id ... on Droid { primaryFunction } } }"#).await;

    assert_eq!(
        result,
        json!({ "data": { "character": { "id": "2001", "primaryFunction": "Astromech" } } })
    );
}

#[tokio::test]
async fn union_members_are_evaluated_against_their_fragments() {
    let result = run("{ items { ... on Sword { damage } ... on Shield { armor } } }").await;

    assert_eq!(
        result,
        json!({ "data": { "items": [{ "damage": 10 }, { "armor": 5 }, { "damage": 7 }] } })
    );
}

#[tokio::test]
async fn unrequested_union_members_are_empty_objects() {
    let result = run("{ items { ... on Shield { id armor } } }").await;

    assert_eq!(
        result,
        json!({ "data": { "items": [{}, { "id": 2, "armor": 5 }, {}] } })
    );
}

#[tokio::test]
async fn typenames_do_not_change_the_statement() {
    let monitor = Arc::new(SqlStatsMonitor::new());
    let engine = engine(monitor.clone()).await;

    let plain = engine
        .compile_and_run("{ items { ... on Sword { damage } ... on Shield { armor } } }", None, None, true)
        .await;

    let typed = engine
        .compile_and_run(
            "{ items { __typename ... on Sword { damage } ... on Shield { armor } } }",
            None,
            None,
            true,
        )
        .await;

    assert_eq!(
        typed,
        json!({
            "data": {
                "items": [
                    { "__typename": "Sword", "damage": 10 },
                    { "__typename": "Shield", "armor": 5 },
                    { "__typename": "Sword", "damage": 7 },
                ]
            }
        })
    );
    assert_eq!(plain["data"]["items"][1], json!({ "armor": 5 }));

    let stats = monitor.take();

    assert_eq!(stats.len(), 2);
    assert_eq!(stats[0].sql, stats[1].sql);
    assert_eq!(stats[0].args, stats[1].args);
    assert_eq!(stats[0].num_cols, 2);
    assert_eq!(stats[1].num_cols, stats[0].num_cols);
}
