use super::{arguments::elaborate_bindings, CompilerContext, Phase};
use crate::{mapping::SelectElaborator as ElaboratorFn, CoreError, FieldResolution, Mapping, Outcome};
use query_structure::{Query, Select};
use std::sync::Arc;
use tracing::trace;

const INTROSPECTION_ROOTS: [&str; 2] = ["__schema", "__type"];

/// Checks selects against the schema, binds their arguments and applies the
/// select elaborators declared by the mapping. Below a delegated field the
/// delegated mapping's elaborators apply. A failing branch is reported and
/// dropped, its siblings still compile.
pub struct SelectElaborator;

impl Phase for SelectElaborator {
    fn name(&self) -> &'static str {
        "select_elaboration"
    }

    fn transform(&self, ctx: &CompilerContext<'_>, query: Query) -> Outcome<Query> {
        let query_type = ctx.mapping.schema().query_type().to_owned();

        let roots = query.into_ungrouped().into_iter().map(|root| match root {
            Query::Select(select) if INTROSPECTION_ROOTS.contains(&select.name.as_str()) => {
                if !ctx.use_introspection {
                    return Outcome::partial(Query::Empty, vec![CoreError::IntrospectionDisabled.into()]);
                }

                let introspection_type = ctx.introspection.schema().query_type().to_owned();

                elaborate(ctx.introspection, Query::Select(select), &introspection_type, &[])
                    .map(|q| Query::Introspect(Box::new(q)))
            }
            other => elaborate(ctx.mapping, other, &query_type, &[]),
        });

        roots.collect::<Outcome<Vec<_>>>().map(Query::group)
    }
}

fn dropped(err: CoreError) -> Outcome<Query> {
    Outcome::partial(Query::Empty, vec![err.into()])
}

/// The elaborator of a field. A delegated field falls back to the delegated
/// mapping's elaborator, declared either on the parent type or as a root.
fn field_elaborator(
    mapping: &dyn Mapping,
    delegated: Option<&Arc<dyn Mapping>>,
    tpe: &str,
    field_name: &str,
) -> Option<ElaboratorFn> {
    mapping.select_elaborator(tpe, field_name).or_else(|| {
        let delegated = delegated?;
        let query_type = delegated.schema().query_type().to_owned();

        delegated
            .select_elaborator(tpe, field_name)
            .or_else(|| delegated.select_elaborator(&query_type, field_name))
    })
}

fn elaborate(mapping: &dyn Mapping, query: Query, tpe: &str, path: &[String]) -> Outcome<Query> {
    let schema = mapping.schema();

    match query {
        Query::Select(select) if select.name == "__typename" => {
            if select.child.is_empty() {
                Outcome::success(Query::Select(select))
            } else {
                dropped(CoreError::elaboration("Field '__typename' must not have a selection set"))
            }
        }

        Query::Select(select) => {
            let Some(field) = schema.field(tpe, &select.name) else {
                return dropped(CoreError::UnknownField {
                    field: select.name,
                    tpe: tpe.to_owned(),
                });
            };

            let bindings = match elaborate_bindings(schema, tpe, field, select.bindings) {
                Ok(bindings) => bindings,
                Err(err) => return dropped(err),
            };

            let child_tpe = field.tpe.underlying_name();
            let is_leaf = schema.is_leaf(child_tpe);

            if is_leaf && !select.child.is_empty() {
                return dropped(CoreError::elaboration(format!(
                    "Leaf field '{}' of type '{tpe}' must not have a selection set",
                    select.name
                )));
            }

            if !is_leaf && select.child.is_empty() {
                return dropped(CoreError::elaboration(format!(
                    "Non-leaf field '{}' of type '{tpe}' requires a selection set",
                    select.name
                )));
            }

            let (name, alias) = (select.name, select.alias);

            let delegated = match mapping.resolve_field(path, tpe, &name) {
                FieldResolution::Delegated(delegate) => Some(delegate.mapping),
                _ => None,
            };

            let child = match &delegated {
                Some(delegated) => elaborate(delegated.as_ref(), *select.child, child_tpe, &[name.clone()]),
                None => {
                    let mut child_path = path.to_vec();
                    child_path.push(name.clone());

                    elaborate(mapping, *select.child, child_tpe, &child_path)
                }
            };

            child.and_then(|child| {
                let select = Select::new(name, child).with_alias(alias).with_bindings(bindings);

                match field_elaborator(mapping, delegated.as_ref(), tpe, &select.name) {
                    Some(elaborator) => {
                        trace!(tpe, field = %select.name, "applying select elaborator");

                        match elaborator(&select) {
                            Ok(query) => Outcome::success(query),
                            Err(err) => dropped(err),
                        }
                    }
                    None => Outcome::success(Query::Select(select)),
                }
            })
        }

        Query::Narrow(type_name, child) if type_name == tpe => elaborate(mapping, *child, tpe, path),

        Query::Narrow(type_name, child) => {
            if !schema.has_type(&type_name) {
                return dropped(CoreError::UnknownType(type_name));
            }

            if !schema.is_subtype(&type_name, tpe) && !schema.is_subtype(tpe, &type_name) {
                return dropped(CoreError::elaboration(format!(
                    "Type condition '{type_name}' can never apply to type '{tpe}'"
                )));
            }

            elaborate(mapping, *child, &type_name, path).map(|child| Query::narrow(type_name, child))
        }

        Query::Group(queries) => queries
            .into_iter()
            .map(|q| elaborate(mapping, q, tpe, path))
            .collect::<Outcome<Vec<_>>>()
            .map(Query::group),

        // Already elaborated.
        other => Outcome::success(other),
    }
}
