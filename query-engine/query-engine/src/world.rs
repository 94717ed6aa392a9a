//! The demo world: countries, their cities and languages, mapped onto four
//! SQLite tables.

use indoc::indoc;
use query_core::{
    query_structure::{OrderSelection, Predicate, Query, Select, Term},
    CoreError, CoreResult, Schema, SchemaRef, Value,
};
use sql_query_connector::{ColumnRef, Queryable, SqlField, SqlJoin, SqlMapping, SqlMappingBuilder};
use std::sync::Arc;

pub const SCHEMA: &str = indoc! {r#"
    type Query {
      cities(namePattern: String = "%", limit: Int): [City!]!
      city(id: Int!): City
      country(code: String!): Country
      countries(continent: String, nameLike: String, limit: Int, byName: Boolean = false): [Country!]!
      language(name: String!): Language
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

pub const SEED: &str = indoc! {r#"
    CREATE TABLE country (code TEXT PRIMARY KEY, name TEXT NOT NULL, continent TEXT NOT NULL, capital INTEGER);
    CREATE TABLE city (id INTEGER PRIMARY KEY, name TEXT NOT NULL, countrycode TEXT NOT NULL, district TEXT NOT NULL, population INTEGER NOT NULL);
    CREATE TABLE language (name TEXT PRIMARY KEY, family TEXT NOT NULL);
    CREATE TABLE countrylanguage (countrycode TEXT NOT NULL, language TEXT NOT NULL, PRIMARY KEY (countrycode, language));

    INSERT INTO country VALUES
      ('BRA', 'Brazil', 'South America', 10),
      ('CHN', 'China', 'Asia', 1),
      ('FRA', 'France', 'Europe', 12),
      ('JPN', 'Japan', 'Asia', 6),
      ('NLD', 'Netherlands', 'Europe', 8);

    INSERT INTO city VALUES
      (1, 'Peking', 'CHN', 'Peking', 7472000),
      (2, 'Shanghai', 'CHN', 'Shanghai', 9696300),
      (3, 'Linhe', 'CHN', 'Inner Mongolia', 133183),
      (4, 'Linhai', 'CHN', 'Zhejiang', 114383),
      (5, 'Linqing', 'CHN', 'Shandong', 123958),
      (6, 'Tokyo', 'JPN', 'Tokyo-to', 7980230),
      (7, 'Osaka', 'JPN', 'Osaka', 2595674),
      (8, 'Amsterdam', 'NLD', 'Noord-Holland', 731200),
      (9, 'Rotterdam', 'NLD', 'Zuid-Holland', 593321),
      (10, 'Brasilia', 'BRA', 'Distrito Federal', 1969868),
      (11, 'Linhares', 'BRA', 'Espirito Santo', 106278),
      (12, 'Paris', 'FRA', 'Ile-de-France', 2125246);

    INSERT INTO language VALUES
      ('Chinese', 'Sino-Tibetan'),
      ('Dutch', 'Germanic'),
      ('French', 'Romance'),
      ('Fries', 'Germanic'),
      ('Japanese', 'Japonic'),
      ('Manchu', 'Tungusic'),
      ('Portuguese', 'Romance');

    INSERT INTO countrylanguage VALUES
      ('BRA', 'Portuguese'),
      ('CHN', 'Chinese'),
      ('CHN', 'Manchu'),
      ('FRA', 'French'),
      ('JPN', 'Japanese'),
      ('NLD', 'Dutch'),
      ('NLD', 'Fries');
"#};

/// Creates the world tables and fills them.
pub async fn seed(database: &dyn Queryable) -> crate::EngineResult<()> {
    database.raw_cmd(SEED).await?;
    info!("seeded the world tables");

    Ok(())
}

pub fn schema() -> crate::EngineResult<SchemaRef> {
    Schema::parse(SCHEMA)
        .map(Arc::new)
        .map_err(|err| crate::error::EngineError::ConfigurationError(err.to_string()))
}

fn col(table: &str, column: &str) -> ColumnRef {
    ColumnRef::new(table, column)
}

fn hop(parent: (&str, &str), child: (&str, &str)) -> SqlJoin {
    SqlJoin::new(col(parent.0, parent.1), col(child.0, child.1))
}

/// The mapping of [`SCHEMA`] onto the world tables.
pub fn mapping(builder: SqlMappingBuilder) -> SqlMapping {
    let roots = ["cities", "city", "country", "countries", "language", "languages"]
        .into_iter()
        .map(|root| builder.root(root))
        .collect();

    builder
        .object("Query", roots)
        .object(
            "City",
            vec![
                SqlField::key("id", col("city", "id")),
                SqlField::column("name", col("city", "name")),
                SqlField::column("district", col("city", "district")),
                SqlField::column("population", col("city", "population")),
                SqlField::object("country", vec![hop(("city", "countrycode"), ("country", "code"))]),
            ],
        )
        .object(
            "Country",
            vec![
                SqlField::key("code", col("country", "code")),
                SqlField::column("name", col("country", "name")),
                SqlField::column("continent", col("country", "continent")),
                SqlField::object("capital", vec![hop(("country", "capital"), ("city", "id"))]),
                SqlField::object("cities", vec![hop(("country", "code"), ("city", "countrycode"))]),
                SqlField::object(
                    "languages",
                    vec![
                        hop(("country", "code"), ("countrylanguage", "countrycode")),
                        hop(("countrylanguage", "language"), ("language", "name")),
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
                        hop(("language", "name"), ("countrylanguage", "language")),
                        hop(("countrylanguage", "countrycode"), ("country", "code")),
                    ],
                ),
            ],
        )
        .select_elaborator("Query", "cities", cities)
        .select_elaborator("Query", "city", |select: &Select| unique_by(select, "id"))
        .select_elaborator("Query", "country", |select: &Select| unique_by(select, "code"))
        .select_elaborator("Query", "countries", countries)
        .select_elaborator("Query", "language", |select: &Select| unique_by(select, "name"))
        .select_elaborator("Country", "cities", |select: &Select| {
            let child = name_pattern(select, (*select.child).clone());
            Ok(Query::Select(select.clone().with_child(child)))
        })
        .build()
}

fn binding<'a>(select: &'a Select, name: &str) -> Option<&'a Value> {
    select.binding(name).filter(|v| !v.is_empty())
}

fn unique_by(select: &Select, field: &str) -> CoreResult<Query> {
    let value = binding(select, field).cloned().unwrap_or_default();
    let child = Query::unique(Query::filter(
        Predicate::eql(Term::field(field), value),
        (*select.child).clone(),
    ));

    Ok(Query::Select(select.clone().with_child(child)))
}

fn name_pattern(select: &Select, child: Query) -> Query {
    match binding(select, "namePattern").and_then(Value::as_str) {
        Some(pattern) => Query::filter(Predicate::like(Term::field("name"), pattern, false), child),
        None => child,
    }
}

fn limit(select: &Select, child: Query) -> CoreResult<Query> {
    match binding(select, "limit").map(|v| v.as_int()) {
        None => Ok(child),
        Some(Some(n)) if n >= 0 => Ok(Query::Limit(n as usize, Box::new(child))),
        Some(_) => Err(CoreError::elaboration(format!(
            "'limit' of field '{}' must not be negative",
            select.name
        ))),
    }
}

fn cities(select: &Select) -> CoreResult<Query> {
    let child = limit(select, (*select.child).clone())?;
    Ok(Query::Select(select.clone().with_child(name_pattern(select, child))))
}

fn countries(select: &Select) -> CoreResult<Query> {
    let mut child = limit(select, (*select.child).clone())?;

    if binding(select, "byName").and_then(Value::as_boolean) == Some(true) {
        child = Query::OrderBy(vec![OrderSelection::asc(Term::field("name"))], Box::new(child));
    }

    let mut predicates = Vec::new();

    if let Some(continent) = binding(select, "continent") {
        predicates.push(Predicate::eql(Term::field("continent"), continent.clone()));
    }

    if let Some(pattern) = binding(select, "nameLike").and_then(Value::as_str) {
        predicates.push(Predicate::like(Term::field("name"), pattern, true));
    }

    if !predicates.is_empty() {
        child = Query::filter(Predicate::all(predicates), child);
    }

    Ok(Query::Select(select.clone().with_child(child)))
}
