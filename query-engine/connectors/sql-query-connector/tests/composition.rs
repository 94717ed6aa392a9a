mod common;

use indoc::indoc;
use pretty_assertions::assert_eq;
use query_core::{
    query_structure::{Predicate, Query, Term},
    CoreError, CoreResult, Cursor, Delegate, FieldMapping, Mapping, QueryEngine, Schema, SchemaRef, ValueField,
    ValueMapping, ValueRoot,
};
use serde_json::json;
use sql_query_connector::{ColumnRef, SqlField, SqlMappingBuilder, SqlStatsMonitor};
use std::sync::Arc;

fn schema() -> SchemaRef {
    Arc::new(
        Schema::parse(indoc! {r#"
            type Query {
              countries: [Country!]!
            }

            type Country {
              code: String!
              name: String!
              currency: Currency
            }

            type Currency {
              code: String!
              name: String!
              countryCode: String!
            }
        "#})
        .unwrap(),
    )
}

fn currencies(schema: &SchemaRef) -> Arc<dyn Mapping> {
    let currencies = json!([
        { "code": "CNY", "name": "Renminbi", "countryCode": "CHN" },
        { "code": "EUR", "name": "Euro", "countryCode": "NLD" },
    ]);

    Arc::new(
        ValueMapping::builder(schema.clone())
            .object("Country", vec![ValueRoot::mapping("currency", currencies)])
            .object("Currency", ValueField::values(["code", "name", "countryCode"]))
            .build(),
    )
}

/// The currency of the parent country, if it has one.
fn join_currency(parent: &dyn Cursor, child: Query) -> CoreResult<Query> {
    let code = parent.field("code")?.as_leaf()?;

    match child {
        Query::Select(select) => {
            let filtered = Query::unique(Query::filter(
                Predicate::eql(Term::field("countryCode"), code),
                (*select.child).clone(),
            ));

            Ok(Query::Select(select.with_child(filtered)))
        }
        other => Err(CoreError::interpreter(format!("Cannot join {other}"))),
    }
}

#[tokio::test]
async fn delegated_fields_join_on_the_columns_of_their_parent() {
    let schema = schema();
    let monitor = Arc::new(SqlStatsMonitor::new());
    let builder = SqlMappingBuilder::new(schema.clone(), common::database().await).monitor(monitor.clone());
    let roots = vec![builder.root("countries")];

    let mapping = builder
        .object("Query", roots)
        .object(
            "Country",
            vec![
                SqlField::key("code", ColumnRef::new("country", "code")),
                SqlField::column("name", ColumnRef::new("country", "name")),
                FieldMapping::Delegate(Delegate::new("currency", currencies(&schema), join_currency)),
            ],
        )
        .build();

    let engine = QueryEngine::new(Arc::new(mapping)).unwrap();
    let result = engine
        .compile_and_run("{ countries { name currency { name } } }", None, None, true)
        .await;

    assert_eq!(
        result,
        json!({
            "data": {
                "countries": [
                    { "name": "China", "currency": { "name": "Renminbi" } },
                    { "name": "Japan", "currency": null },
                    { "name": "Netherlands", "currency": { "name": "Euro" } },
                ]
            }
        })
    );

    let stats = monitor.take();

    assert_eq!(stats.len(), 1);
    assert_eq!(
        stats[0].sql,
        "SELECT `t0`.`code`, `t0`.`name` FROM `country` AS `t0` ORDER BY `t0`.`code` ASC"
    );
}
