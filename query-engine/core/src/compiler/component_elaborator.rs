use super::{CompilerContext, Phase};
use crate::{CoreResult, FieldResolution, Mapping, Outcome, Problem};
use query_structure::{Component, Query, Select};

/// Rewrites selects of delegated fields into `Component`s. The subtree below
/// a component is elaborated against the delegated mapping.
pub struct ComponentElaborator;

impl Phase for ComponentElaborator {
    fn name(&self) -> &'static str {
        "component_elaboration"
    }

    fn transform(&self, ctx: &CompilerContext<'_>, query: Query) -> Outcome<Query> {
        let query_type = ctx.mapping.schema().query_type().to_owned();
        let mut problems: Vec<Problem> = Vec::new();
        let mut roots = Vec::new();

        for root in query.into_ungrouped() {
            if matches!(root, Query::Introspect(_)) {
                roots.push(root);
                continue;
            }

            match elaborate(ctx.mapping, root, &query_type, &[]) {
                Ok(root) => roots.push(root),
                Err(err) => problems.push(err.into()),
            }
        }

        Outcome::partial(Query::group(roots), problems)
    }
}

fn elaborate(mapping: &dyn Mapping, query: Query, tpe: &str, path: &[String]) -> CoreResult<Query> {
    let rewrap = |child: Box<Query>, tpe: &str| elaborate(mapping, *child, tpe, path).map(Box::new);

    Ok(match query {
        Query::Select(select) if select.name == "__typename" => Query::Select(select),

        Query::Select(select) => {
            let child_tpe = mapping
                .schema()
                .field(tpe, &select.name)
                .map(|f| f.tpe.underlying_name().to_owned())
                .unwrap_or_else(|| tpe.to_owned());

            match mapping.resolve_field(path, tpe, &select.name) {
                FieldResolution::Delegated(delegate) => {
                    let delegated_path = [select.name.clone()];
                    let child = elaborate(delegate.mapping.as_ref(), *select.child, &child_tpe, &delegated_path)?;

                    Query::Component(Component {
                        type_name: tpe.to_owned(),
                        field_name: select.name.clone(),
                        child: Box::new(Query::Select(Select {
                            child: Box::new(child),
                            ..select
                        })),
                    })
                }
                _ => {
                    let mut child_path = path.to_vec();
                    child_path.push(select.name.clone());

                    let child = elaborate(mapping, *select.child, &child_tpe, &child_path)?;
                    Query::Select(Select {
                        child: Box::new(child),
                        ..select
                    })
                }
            }
        }

        Query::Filter(p, child) => Query::Filter(p, rewrap(child, tpe)?),
        Query::Unique(child) => Query::Unique(rewrap(child, tpe)?),
        Query::Limit(n, child) => Query::Limit(n, rewrap(child, tpe)?),
        Query::OrderBy(o, child) => Query::OrderBy(o, rewrap(child, tpe)?),
        Query::Narrow(t, child) => {
            let child = rewrap(child, &t)?;
            Query::Narrow(t, child)
        }
        Query::Group(queries) => Query::Group(
            queries
                .into_iter()
                .map(|q| elaborate(mapping, q, tpe, path))
                .collect::<CoreResult<_>>()?,
        ),
        other @ (Query::Component(_) | Query::Introspect(_) | Query::Empty) => other,
    })
}
