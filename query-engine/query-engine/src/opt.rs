use crate::LogFormat;
use serde_json::Value as Json;
use structopt::StructOpt;

#[derive(Debug, Clone, StructOpt)]
#[structopt(name = "query-engine", about = "Runs GraphQL requests against the world database")]
pub struct EngineOpt {
    /// Path to the SQLite database. The demo data is loaded into an in-memory
    /// database when omitted.
    #[structopt(long, short = "d")]
    pub database: Option<String>,

    /// Creates and fills the world tables in the database before running.
    #[structopt(long)]
    pub seed: bool,

    /// The request text. Read from stdin when omitted.
    #[structopt(long, short = "q")]
    pub query: Option<String>,

    /// Selects the operation to run from a request with several.
    #[structopt(long)]
    pub operation_name: Option<String>,

    /// Variables of the request as a JSON object.
    #[structopt(long, parse(try_from_str = parse_variables))]
    pub variables: Option<Json>,

    /// Rejects `__schema` and `__type` queries.
    #[structopt(long)]
    pub no_introspection: bool,

    /// Validates the mapping, prints its findings and exits.
    #[structopt(long)]
    pub validate: bool,

    /// Log output format, `text` or `json`.
    #[structopt(long, default_value = "text")]
    pub log_format: LogFormat,

    /// Logs every executed statement.
    #[structopt(long)]
    pub log_queries: bool,
}

impl EngineOpt {
    pub fn use_introspection(&self) -> bool {
        !self.no_introspection
    }
}

fn parse_variables(text: &str) -> Result<Json, String> {
    match serde_json::from_str(text) {
        Ok(Json::Object(map)) => Ok(Json::Object(map)),
        Ok(other) => Err(format!("Variables must be a JSON object, got {other}")),
        Err(err) => Err(format!("Invalid variables: {err}")),
    }
}
