use crate::{opt::EngineOpt, world, EngineResult};
use query_core::{Mapping, QueryEngine, Severity};
use serde_json::{json, Value as Json};
use sql_query_connector::{SqlMappingBuilder, Sqlite};
use std::sync::Arc;
use tokio::io::AsyncReadExt;

/// One GraphQL request.
#[derive(Debug, Clone)]
pub struct Request {
    pub text: String,
    pub operation_name: Option<String>,
    pub variables: Option<Json>,
    pub use_introspection: bool,
}

pub enum CliCommand {
    Validate,
    Execute(Request),
}

impl CliCommand {
    /// Reads the request from stdin unless it was given on the command line.
    pub async fn from_opt(opts: &EngineOpt) -> EngineResult<CliCommand> {
        if opts.validate {
            return Ok(CliCommand::Validate);
        }

        let text = match &opts.query {
            Some(query) => query.clone(),
            None => {
                let mut text = String::new();
                tokio::io::stdin().read_to_string(&mut text).await?;
                text
            }
        };

        Ok(CliCommand::Execute(Request {
            text,
            operation_name: opts.operation_name.clone(),
            variables: opts.variables.clone(),
            use_introspection: opts.use_introspection(),
        }))
    }

    pub async fn execute(self, engine: &QueryEngine) -> Json {
        match self {
            CliCommand::Validate => {
                let findings: Vec<Json> = engine
                    .mapping()
                    .validate()
                    .into_iter()
                    .map(|f| json!({ "severity": format!("{:?}", f.severity), "message": f.message }))
                    .collect();

                json!({ "findings": findings })
            }
            CliCommand::Execute(request) => {
                engine
                    .compile_and_run(
                        &request.text,
                        request.operation_name.as_deref(),
                        request.variables.as_ref(),
                        request.use_introspection,
                    )
                    .await
            }
        }
    }
}

/// Opens the database of the options. An in-memory database always gets the
/// demo data.
pub async fn database(opts: &EngineOpt) -> EngineResult<Arc<Sqlite>> {
    let (database, seed) = match &opts.database {
        Some(path) => (Sqlite::new(path)?, opts.seed),
        None => (Sqlite::new_in_memory()?, true),
    };

    if seed {
        world::seed(&database).await?;
    }

    Ok(Arc::new(database))
}

/// The engine over the world mapping. Validation findings are logged, they
/// don't prevent startup.
pub fn engine(database: Arc<Sqlite>) -> EngineResult<QueryEngine> {
    let mapping = world::mapping(SqlMappingBuilder::new(world::schema()?, database));

    for finding in mapping.validate() {
        match finding.severity {
            Severity::Error | Severity::Warning => warn!(finding = %finding.message, "mapping validation"),
            Severity::Info => info!(finding = %finding.message, "mapping validation"),
        }
    }

    Ok(QueryEngine::new(Arc::new(mapping))?)
}
