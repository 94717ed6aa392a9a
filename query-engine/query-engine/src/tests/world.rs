use crate::{
    cli::{self, CliCommand, Request},
    opt::EngineOpt,
};
use pretty_assertions::assert_eq;
use query_core::QueryEngine;
use serde_json::{json, Value as Json};
use structopt::StructOpt;

async fn engine() -> QueryEngine {
    let opts = EngineOpt::from_iter(["query-engine"]);
    let database = cli::database(&opts).await.unwrap();

    cli::engine(database).unwrap()
}

async fn run(query: &str) -> Json {
    engine().await.compile_and_run(query, None, None, true).await
}

#[tokio::test]
async fn the_world_mapping_is_valid() {
    let findings = CliCommand::Validate.execute(&engine().await).await;

    assert_eq!(findings, json!({ "findings": [] }));
}

#[tokio::test]
async fn cities_by_name_pattern() {
    let result = run(r#"{ cities(namePattern: "Linh%") { name country { code } } }"#).await;

    assert_eq!(
        result,
        json!({
            "data": {
                "cities": [
                    { "name": "Linhe", "country": { "code": "CHN" } },
                    { "name": "Linhai", "country": { "code": "CHN" } },
                    { "name": "Linhares", "country": { "code": "BRA" } },
                ]
            }
        })
    );
}

#[tokio::test]
async fn countries_filtered_sorted_and_limited() {
    let result = run(r#"{ countries(nameLike: "%A%", byName: true, limit: 3) { name } }"#).await;

    assert_eq!(
        result,
        json!({
            "data": { "countries": [{ "name": "Brazil" }, { "name": "China" }, { "name": "France" }] }
        })
    );

    let result = run(r#"{ countries(continent: "Europe") { code capital { name } languages { name } } }"#).await;

    assert_eq!(
        result,
        json!({
            "data": {
                "countries": [
                    { "code": "FRA", "capital": { "name": "Paris" }, "languages": [{ "name": "French" }] },
                    {
                        "code": "NLD",
                        "capital": { "name": "Amsterdam" },
                        "languages": [{ "name": "Dutch" }, { "name": "Fries" }],
                    },
                ]
            }
        })
    );
}

#[tokio::test]
async fn negative_limits_are_problems() {
    let result = run("{ cities(limit: -1) { name } }").await;

    assert_eq!(
        result,
        json!({ "errors": [{ "message": "'limit' of field 'cities' must not be negative" }] })
    );
}

#[tokio::test]
async fn requests_carry_operation_names_and_variables() {
    let command = CliCommand::Execute(Request {
        text: indoc::indoc! {r#"
            query Languages { languages { name } }
            query Country($code: String!) { country(code: $code) { name cities(namePattern: "Rot%") { name } } }
        "#}
        .to_owned(),
        operation_name: Some("Country".to_owned()),
        variables: Some(json!({ "code": "NLD" })),
        use_introspection: false,
    });

    let result = command.execute(&engine().await).await;

    assert_eq!(
        result,
        json!({ "data": { "country": { "name": "Netherlands", "cities": [{ "name": "Rotterdam" }] } } })
    );
}

#[tokio::test]
async fn languages_are_shared_between_countries() {
    let result = run(r#"{ language(name: "Fries") { family countries { name } } }"#).await;

    assert_eq!(
        result,
        json!({ "data": { "language": { "family": "Germanic", "countries": [{ "name": "Netherlands" }] } } })
    );
}
