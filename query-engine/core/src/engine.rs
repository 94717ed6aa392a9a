use crate::{
    introspection::introspection_mapping, CoreResult, GQLResponse, Mapping, Outcome, QueryCompiler, QueryInterpreter,
};
use query_structure::Query;
use serde_json::Value as Json;
use std::sync::Arc;
use tracing::info_span;
use tracing_futures::Instrument;

/// Compiles and runs GraphQL requests against one mapping.
pub struct QueryEngine {
    mapping: Arc<dyn Mapping>,
    compiler: QueryCompiler,
    interpreter: QueryInterpreter,
}

impl QueryEngine {
    /// Sets up the engine, including the introspection mapping derived from
    /// the mapping's schema.
    pub fn new(mapping: Arc<dyn Mapping>) -> CoreResult<Self> {
        let introspection: Arc<dyn Mapping> = Arc::new(introspection_mapping(mapping.schema())?);

        Ok(QueryEngine {
            compiler: QueryCompiler::new(Arc::clone(&mapping), Arc::clone(&introspection)),
            interpreter: QueryInterpreter::new(Arc::clone(&mapping), introspection),
            mapping,
        })
    }

    pub fn mapping(&self) -> &Arc<dyn Mapping> {
        &self.mapping
    }

    pub fn compile(
        &self,
        text: &str,
        operation_name: Option<&str>,
        variables: Option<&Json>,
        use_introspection: bool,
    ) -> Outcome<Query> {
        self.compiler.compile(text, operation_name, variables, use_introspection)
    }

    pub async fn run(&self, query: &Query) -> Outcome<Json> {
        self.interpreter.run(query).await
    }

    /// Compiles and runs a request. Whatever part of the request compiled is
    /// run; the problems of both stages are reported together.
    pub async fn execute(
        &self,
        text: &str,
        operation_name: Option<&str>,
        variables: Option<&Json>,
        use_introspection: bool,
    ) -> GQLResponse {
        let span = info_span!("execute", operation = operation_name.unwrap_or_default());

        async move {
            let compiled = self.compile(text, operation_name, variables, use_introspection);

            let outcome = match compiled.value {
                Some(query) if !(query.is_empty() && !compiled.problems.is_empty()) => {
                    let mut outcome = self.run(&query).await;
                    let mut problems = compiled.problems;

                    problems.append(&mut outcome.problems);
                    outcome.problems = problems;
                    outcome
                }
                _ => Outcome {
                    value: None,
                    problems: compiled.problems,
                },
            };

            GQLResponse::from(outcome)
        }
        .instrument(span)
        .await
    }

    /// Runs a request and renders the response document.
    pub async fn compile_and_run(
        &self,
        text: &str,
        operation_name: Option<&str>,
        variables: Option<&Json>,
        use_introspection: bool,
    ) -> Json {
        self.execute(text, operation_name, variables, use_introspection)
            .await
            .into_json()
    }

    /// Same as `compile_and_run`, driven to completion on the current thread.
    pub fn compile_and_run_blocking(
        &self,
        text: &str,
        operation_name: Option<&str>,
        variables: Option<&Json>,
        use_introspection: bool,
    ) -> Json {
        futures::executor::block_on(self.compile_and_run(text, operation_name, variables, use_introspection))
    }
}
