//! Compilation of GraphQL text into the query algebra.

mod arguments;
mod component_elaborator;
pub(crate) mod parser;
mod select_elaborator;

pub use component_elaborator::ComponentElaborator;
pub use select_elaborator::SelectElaborator;

use crate::{Mapping, Outcome};
use query_structure::Query;
use std::sync::Arc;
use tracing::{debug, trace};

/// What a phase sees of the engine.
pub struct CompilerContext<'a> {
    pub mapping: &'a dyn Mapping,
    pub introspection: &'a dyn Mapping,
    pub use_introspection: bool,
}

/// A rewrite of the algebra. Phases run in a fixed order, each receiving the
/// output of the previous one.
pub trait Phase: Send + Sync {
    fn name(&self) -> &'static str;

    fn transform(&self, ctx: &CompilerContext<'_>, query: Query) -> Outcome<Query>;
}

pub struct QueryCompiler {
    mapping: Arc<dyn Mapping>,
    introspection: Arc<dyn Mapping>,
    phases: Vec<Box<dyn Phase>>,
}

impl QueryCompiler {
    /// A compiler running selection elaboration, then component elaboration.
    pub fn new(mapping: Arc<dyn Mapping>, introspection: Arc<dyn Mapping>) -> Self {
        QueryCompiler {
            mapping,
            introspection,
            phases: vec![Box::new(SelectElaborator), Box::new(ComponentElaborator)],
        }
    }

    pub fn compile(
        &self,
        text: &str,
        operation_name: Option<&str>,
        variables: Option<&serde_json::Value>,
        use_introspection: bool,
    ) -> Outcome<Query> {
        let parsed: Outcome<Query> = parser::parse(text, operation_name, variables).into();
        let outcome = self.compile_query(parsed, use_introspection);

        if let Some(query) = &outcome.value {
            debug!(query = %query, problems = outcome.problems.len(), "compiled query");
        }

        outcome
    }

    /// Runs the phases over an already parsed query.
    pub fn compile_query(&self, query: Outcome<Query>, use_introspection: bool) -> Outcome<Query> {
        let ctx = CompilerContext {
            mapping: self.mapping.as_ref(),
            introspection: self.introspection.as_ref(),
            use_introspection,
        };

        self.phases.iter().fold(query, |outcome, phase| {
            outcome.and_then(|query| {
                trace!(phase = phase.name(), "running compiler phase");
                phase.transform(&ctx, query)
            })
        })
    }
}
