mod world;

use crate::{logger::create_env_filter, opt::EngineOpt, LogFormat};
use pretty_assertions::assert_eq;
use serde_json::json;
use structopt::StructOpt;

#[test]
fn options_default_to_text_logs_and_introspection() {
    let opts = EngineOpt::from_iter(["query-engine", "--query", "{ languages { name } }"]);

    assert_eq!(opts.query.as_deref(), Some("{ languages { name } }"));
    assert_eq!(opts.log_format, LogFormat::Text);
    assert!(opts.use_introspection());
    assert!(opts.database.is_none());
}

#[test]
fn variables_must_be_an_object() {
    let opts = EngineOpt::from_iter([
        "query-engine",
        "--variables",
        r#"{ "code": "NLD" }"#,
        "--log-format",
        "json",
        "--no-introspection",
    ]);

    assert_eq!(opts.variables, Some(json!({ "code": "NLD" })));
    assert_eq!(opts.log_format, LogFormat::Json);
    assert!(!opts.use_introspection());

    assert!(EngineOpt::from_iter_safe(["query-engine", "--variables", "[1]"]).is_err());
    assert!(EngineOpt::from_iter_safe(["query-engine", "--log-format", "yaml"]).is_err());
}

#[test]
fn qe_log_level_applies_to_the_engine_crates() {
    let filter = create_env_filter(true, Some("trace")).unwrap().to_string();

    for directive in [
        "query_engine=trace",
        "query_core=trace",
        "sql_query_connector=trace",
        "sql_query_connector::stats=debug",
    ] {
        assert!(filter.contains(directive), "{directive} missing from {filter}");
    }

    assert!(create_env_filter(false, Some("loud")).is_err());
}
