use indoc::indoc;
use pretty_assertions::assert_eq;
use query_core::{
    query_structure::{Binding, Query},
    QueryEngine, Schema, Value, ValueField, ValueMapping, ValueRoot,
};
use serde_json::json;
use std::sync::Arc;

fn engine() -> QueryEngine {
    let schema = Schema::parse(indoc! {r#"
        type Query {
          cities(filter: CityFilter, limit: Int = 10): [City!]!
        }

        input CityFilter {
          namePattern: String = "%"
          population: Int
          countryCode: String!
        }

        type City {
          name: String!
        }
    "#})
    .unwrap();

    let mapping = ValueMapping::builder(Arc::new(schema))
        .object("Query", vec![ValueRoot::mapping("cities", json!([]))])
        .object("City", ValueField::values(["name"]))
        .build();

    QueryEngine::new(Arc::new(mapping)).unwrap()
}

fn root_bindings(query: &str) -> Vec<Binding> {
    let compiled = engine().compile(query, None, None, true).into_result().unwrap();

    match compiled {
        Query::Select(select) => select.bindings,
        other => panic!("expected a root select, got {other}"),
    }
}

#[test]
fn omitted_input_fields_get_defaults_or_stay_absent() {
    let bindings = root_bindings(r#"{ cities(filter: { countryCode: "CHN" }) { name } }"#);

    assert_eq!(
        bindings,
        vec![
            Binding::new(
                "filter",
                Value::object([
                    ("namePattern", Value::from("%")),
                    ("population", Value::Absent),
                    ("countryCode", Value::from("CHN")),
                ]),
            ),
            Binding::new("limit", Value::Int(10)),
        ]
    );
}

#[test]
fn explicit_nulls_are_kept_apart_from_absent_values() {
    let bindings = root_bindings(r#"{ cities(filter: { countryCode: "CHN", population: null }) { name } }"#);

    assert_eq!(
        bindings[0].value.get("population"),
        Some(&Value::Null)
    );
}

#[test]
fn unknown_input_fields_are_named_in_the_problem() {
    let result = engine().compile_and_run_blocking(
        r#"{ cities(filter: { countryCode: "CHN", bogus: 1 }) { name } }"#,
        None,
        None,
        true,
    );

    assert_eq!(
        result,
        json!({
            "errors": [{
                "message": "Unknown field(s) 'bogus' in input object value of type CityFilter in field 'cities' of type 'Query'"
            }]
        })
    );
}

#[test]
fn missing_required_input_fields_are_problems() {
    let result = engine().compile_and_run_blocking(r#"{ cities(filter: { population: 3 }) { name } }"#, None, None, true);

    assert_eq!(
        result,
        json!({
            "errors": [{
                "message": "Missing required field 'countryCode' of input object type CityFilter in field 'cities' of type 'Query'"
            }]
        })
    );
}

#[test]
fn unknown_arguments_are_problems() {
    let result = engine().compile_and_run_blocking("{ cities(first: 3) { name } }", None, None, true);

    assert_eq!(
        result,
        json!({ "errors": [{ "message": "Unknown argument(s) 'first' in field 'cities' of type 'Query'" }] })
    );
}
