#![allow(dead_code)]

//! A small slice of the world database and its mapping.

use indoc::indoc;
use query_core::{
    query_structure::{Predicate, Query, Select, Term},
    CoreError, CoreResult, CursorField, FieldMapping, QueryEngine, Schema, Value,
};
use sql_query_connector::{
    ColumnRef, Queryable, SqlField, SqlJoin, SqlMappingBuilder, SqlStatsMonitor, Sqlite,
};
use std::sync::Arc;

pub const SCHEMA: &str = indoc! {r#"
    type Query {
      cities(namePattern: String = "%", limit: Int, countryName: String): [City!]!
      city(id: Int!): City
      country(code: String, continent: String): Country
      countries(nameLike: String): [Country!]!
      languages: [Language!]!
    }

    type City {
      id: Int!
      name: String!
      district: String!
      population: Int!
      country: Country!
    }

    type Country {
      code: String!
      name: String!
      continent: String!
      summary: String!
      capital: City
      cities(namePattern: String = "%"): [City!]!
      languages: [Language!]!
    }

    type Language {
      name: String!
      family: String!
      countries: [Country!]!
    }
"#};

const SEED: &str = indoc! {r#"
    CREATE TABLE country (code TEXT PRIMARY KEY, name TEXT NOT NULL, continent TEXT NOT NULL, capital INTEGER);
    CREATE TABLE city (id INTEGER PRIMARY KEY, name TEXT NOT NULL, countrycode TEXT NOT NULL, district TEXT NOT NULL, population INTEGER NOT NULL);
    CREATE TABLE language (name TEXT PRIMARY KEY, family TEXT NOT NULL);
    CREATE TABLE countrylanguage (countrycode TEXT NOT NULL, language TEXT NOT NULL, PRIMARY KEY (countrycode, language));

    INSERT INTO country VALUES
      ('CHN', 'China', 'Asia', 4),
      ('JPN', 'Japan', 'Asia', NULL),
      ('NLD', 'Netherlands', 'Europe', 5);

    INSERT INTO city VALUES
      (1, 'Linhe', 'CHN', 'Inner Mongolia', 133183),
      (2, 'Linhai', 'CHN', 'Zhejiang', 114383),
      (3, 'Linqing', 'CHN', 'Shandong', 123958),
      (4, 'Peking', 'CHN', 'Peking', 7472000),
      (5, 'Amsterdam', 'NLD', 'Noord-Holland', 731200),
      (6, 'Rotterdam', 'NLD', 'Zuid-Holland', 593321);

    INSERT INTO language VALUES
      ('Chinese', 'Sino-Tibetan'),
      ('Dutch', 'Germanic'),
      ('Fries', 'Germanic'),
      ('Japanese', 'Japonic'),
      ('Manchu', 'Tungusic');

    INSERT INTO countrylanguage VALUES
      ('CHN', 'Chinese'),
      ('CHN', 'Manchu'),
      ('JPN', 'Japanese'),
      ('NLD', 'Dutch'),
      ('NLD', 'Fries');
"#};

pub struct World {
    pub engine: QueryEngine,
    pub monitor: Arc<SqlStatsMonitor>,
}

impl World {
    pub async fn run(&self, query: &str) -> serde_json::Value {
        self.engine.compile_and_run(query, None, None, true).await
    }
}

fn col(table: &str, column: &str) -> ColumnRef {
    ColumnRef::new(table, column)
}

fn join(parent: (&str, &str), child: (&str, &str)) -> SqlJoin {
    SqlJoin::new(col(parent.0, parent.1), col(child.0, child.1))
}

fn with_name_pattern(select: &Select, child: Query) -> Query {
    match select.binding("namePattern").and_then(Value::as_str) {
        Some(pattern) => Query::filter(Predicate::like(Term::field("name"), pattern, false), child),
        None => child,
    }
}

fn cities(select: &Select) -> CoreResult<Query> {
    let mut child = (*select.child).clone();

    if let Some(limit) = select.binding("limit").and_then(Value::as_int) {
        let limit = usize::try_from(limit).map_err(|_| CoreError::elaboration("'limit' must not be negative"))?;
        child = Query::Limit(limit, Box::new(child));
    }

    child = with_name_pattern(select, child);

    if let Some(country) = select.binding("countryName").and_then(Value::as_str) {
        child = Query::filter(Predicate::eql(Term::path(["country", "name"]), country), child);
    }

    Ok(Query::Select(select.clone().with_child(child)))
}

fn city(select: &Select) -> CoreResult<Query> {
    let id = select.binding("id").cloned().unwrap_or_default();
    let child = Query::unique(Query::filter(Predicate::eql(Term::field("id"), id), (*select.child).clone()));

    Ok(Query::Select(select.clone().with_child(child)))
}

fn country(select: &Select) -> CoreResult<Query> {
    let predicate = Predicate::all(["code", "continent"].into_iter().filter_map(|arg| {
        select
            .binding(arg)
            .filter(|v| !v.is_empty())
            .map(|v| Predicate::eql(Term::field(arg), v.clone()))
    }));

    let child = Query::unique(Query::filter(predicate, (*select.child).clone()));

    Ok(Query::Select(select.clone().with_child(child)))
}

fn countries(select: &Select) -> CoreResult<Query> {
    let child = match select.binding("nameLike").and_then(Value::as_str) {
        Some(pattern) => Query::filter(
            Predicate::like(Term::field("name"), pattern, true),
            (*select.child).clone(),
        ),
        None => (*select.child).clone(),
    };

    Ok(Query::Select(select.clone().with_child(child)))
}

fn country_cities(select: &Select) -> CoreResult<Query> {
    let child = with_name_pattern(select, (*select.child).clone());
    Ok(Query::Select(select.clone().with_child(child)))
}

fn summary() -> FieldMapping<SqlField> {
    FieldMapping::CursorField(CursorField::new(
        "summary",
        vec!["name".into(), "continent".into()],
        |cursor| {
            let name = cursor.field("name")?.as_leaf()?;
            let continent = cursor.field("continent")?.as_leaf()?;

            Ok(Value::from(format!(
                "{} ({})",
                name.as_str().unwrap_or_default(),
                continent.as_str().unwrap_or_default()
            )))
        },
    ))
}

pub async fn database() -> Arc<Sqlite> {
    let database = Sqlite::new_in_memory().unwrap();
    database.raw_cmd(SEED).await.unwrap();

    Arc::new(database)
}

pub fn builder(database: Arc<Sqlite>, monitor: Arc<SqlStatsMonitor>) -> SqlMappingBuilder {
    let schema = Arc::new(Schema::parse(SCHEMA).unwrap());
    let builder = SqlMappingBuilder::new(schema, database).monitor(monitor);

    let roots = vec![
        builder.root("cities"),
        builder.root("city"),
        builder.root("country"),
        builder.root("countries"),
        builder.root("languages"),
    ];

    builder
        .object("Query", roots)
        .object(
            "City",
            vec![
                SqlField::key("id", col("city", "id")),
                SqlField::column("name", col("city", "name")),
                SqlField::column("district", col("city", "district")),
                SqlField::column("population", col("city", "population")),
                SqlField::object("country", vec![join(("city", "countrycode"), ("country", "code"))]),
            ],
        )
        .object(
            "Country",
            vec![
                SqlField::key("code", col("country", "code")),
                SqlField::column("name", col("country", "name")),
                SqlField::column("continent", col("country", "continent")),
                summary(),
                SqlField::object("capital", vec![join(("country", "capital"), ("city", "id"))]),
                SqlField::object("cities", vec![join(("country", "code"), ("city", "countrycode"))]),
                SqlField::object(
                    "languages",
                    vec![
                        join(("country", "code"), ("countrylanguage", "countrycode")),
                        join(("countrylanguage", "language"), ("language", "name")),
                    ],
                ),
            ],
        )
        .object(
            "Language",
            vec![
                SqlField::key("name", col("language", "name")),
                SqlField::column("family", col("language", "family")),
                SqlField::object(
                    "countries",
                    vec![
                        join(("language", "name"), ("countrylanguage", "language")),
                        join(("countrylanguage", "countrycode"), ("country", "code")),
                    ],
                ),
            ],
        )
        .select_elaborator("Query", "cities", cities)
        .select_elaborator("Query", "city", city)
        .select_elaborator("Query", "country", country)
        .select_elaborator("Query", "countries", countries)
        .select_elaborator("Country", "cities", country_cities)
}

pub async fn world() -> World {
    let monitor = Arc::new(SqlStatsMonitor::new());
    let mapping = builder(database().await, monitor.clone()).build();

    World {
        engine: QueryEngine::new(Arc::new(mapping)).unwrap(),
        monitor,
    }
}
