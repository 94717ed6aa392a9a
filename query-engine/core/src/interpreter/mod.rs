//! Evaluation of compiled queries against mappings.

mod filter;

use crate::{CoreError, CoreResult, CursorRef, Delegate, FieldResolution, Mapping, Outcome, Problem};
use futures::future::{join_all, BoxFuture, FutureExt};
use query_structure::{Query, Select};
use serde_json::{Map, Value as Json};
use std::sync::Arc;
use tracing::{debug, trace};

type Fields = Vec<(String, Json)>;

/// Walks a compiled query, obtaining cursors from root mappings and asking
/// them for values. Independent root fields run concurrently and fail
/// independently: a failed root is `null` in the data and reported as a
/// problem with the root's response key as path.
pub struct QueryInterpreter {
    mapping: Arc<dyn Mapping>,
    introspection: Arc<dyn Mapping>,
}

impl QueryInterpreter {
    pub fn new(mapping: Arc<dyn Mapping>, introspection: Arc<dyn Mapping>) -> Self {
        QueryInterpreter { mapping, introspection }
    }

    #[tracing::instrument(skip_all, fields(query = %query))]
    pub async fn run(&self, query: &Query) -> Outcome<Json> {
        let branches = query.ungroup().into_iter().map(|root| self.run_root_branch(root));
        let mut data = Map::new();
        let mut problems = Vec::new();

        for (fields, branch_problems) in join_all(branches).await {
            data.extend(fields);
            problems.extend(branch_problems);
        }

        Outcome::partial(Json::Object(data), problems)
    }

    async fn run_root_branch(&self, query: &Query) -> (Fields, Vec<Problem>) {
        let (mapping, query) = match query {
            Query::Introspect(inner) => (&self.introspection, inner.as_ref()),
            other => (&self.mapping, other),
        };

        let query_type = mapping.schema().query_type().to_owned();
        let mut fields = Vec::new();
        let mut problems = Vec::new();

        for root in query.ungroup() {
            let (key, result) = match root {
                Query::Select(select) if select.name == "__typename" => {
                    fields.push((select.result_name().to_owned(), Json::String(query_type.clone())));
                    continue;
                }
                Query::Select(select) => (
                    select.result_name(),
                    self.run_root_select(mapping, &query_type, select).await,
                ),
                Query::Component(component) => match component.child.as_ref() {
                    Query::Select(select) => (select.result_name(), self.run_root_component(mapping, &query_type, select).await),
                    other => {
                        problems.push(CoreError::interpreter(format!("Malformed component {other}")).into());
                        continue;
                    }
                },
                other => {
                    problems.push(CoreError::interpreter(format!("Unexpected root query {other}")).into());
                    continue;
                }
            };

            match result {
                Ok(value) => fields.push((key.to_owned(), value)),
                Err(err) => {
                    debug!(field = key, error = %err, "root field failed");
                    fields.push((key.to_owned(), Json::Null));
                    problems.push(Problem::from(err).with_path(vec![key.to_owned()]));
                }
            }
        }

        (fields, problems)
    }

    /// A root field delegated to another mapping has no parent to join with.
    async fn run_root_component(&self, mapping: &Arc<dyn Mapping>, query_type: &str, select: &Select) -> CoreResult<Json> {
        match mapping.resolve_field(&[], query_type, &select.name) {
            FieldResolution::Delegated(delegate) => self.run_root_select(&delegate.mapping, query_type, select).await,
            _ => Err(CoreError::MissingRootMapping(select.name.clone())),
        }
    }

    fn run_root_select<'a>(
        &'a self,
        mapping: &'a Arc<dyn Mapping>,
        type_name: &'a str,
        select: &'a Select,
    ) -> BoxFuture<'a, CoreResult<Json>> {
        async move {
            let (residual, cursor) = mapping.run_root(type_name, select).await?;
            trace!(field = %select.name, residual = %residual, "obtained root cursor");

            self.run_value(mapping, &residual, cursor).await
        }
        .boxed()
    }

    fn run_delegated<'a>(&'a self, delegate: &'a Delegate, type_name: &'a str, query: Query) -> BoxFuture<'a, CoreResult<Json>> {
        async move {
            match query {
                Query::Select(select) => self.run_root_select(&delegate.mapping, type_name, &select).await,
                other => Err(CoreError::interpreter(format!(
                    "Join of delegated field '{}' must produce a select, found {other}",
                    delegate.field_name
                ))),
            }
        }
        .boxed()
    }

    fn run_value<'a>(
        &'a self,
        mapping: &'a Arc<dyn Mapping>,
        query: &'a Query,
        cursor: CursorRef,
    ) -> BoxFuture<'a, CoreResult<Json>> {
        async move {
            if is_list_operation(query) {
                let nullable = cursor.is_nullable();
                let elems = cursor.as_list()?;
                let path = cursor.path().join(".");

                return self.run_list(mapping, query, elems, nullable, path).await;
            }

            if cursor.is_nullable() {
                return match cursor.as_nullable()? {
                    Some(inner) => self.run_value(mapping, query, inner).await,
                    None => Ok(Json::Null),
                };
            }

            if cursor.is_list() {
                let mut values = Vec::new();

                for elem in cursor.as_list()? {
                    values.push(self.run_value(mapping, query, elem).await?);
                }

                return Ok(Json::Array(values));
            }

            if cursor.is_leaf() {
                let tpe = cursor.tpe().underlying_name();
                return mapping.encode_leaf(tpe, &cursor.as_leaf()?);
            }

            let fields = self.run_fields(mapping, query, cursor).await?;
            Ok(Json::Object(fields.into_iter().collect()))
        }
        .boxed()
    }

    /// Applies filters, orderings, limits and uniqueness to the elements of a
    /// list, outermost first, then evaluates the remaining query per element.
    fn run_list<'a>(
        &'a self,
        mapping: &'a Arc<dyn Mapping>,
        query: &'a Query,
        mut elems: Vec<CursorRef>,
        nullable: bool,
        path: String,
    ) -> BoxFuture<'a, CoreResult<Json>> {
        async move {
            let mut query = query;
            let mut unique = false;

            loop {
                match query {
                    Query::Filter(predicate, child) => {
                        let mut kept = Vec::with_capacity(elems.len());

                        for elem in elems {
                            if filter::eval(mapping.as_ref(), predicate, elem.as_ref())? {
                                kept.push(elem);
                            }
                        }

                        elems = kept;
                        query = child;
                    }
                    Query::OrderBy(selections, child) => {
                        elems = filter::order(mapping.as_ref(), selections, elems)?;
                        query = child;
                    }
                    Query::Limit(n, child) => {
                        elems.truncate(*n);
                        query = child;
                    }
                    Query::Unique(child) => {
                        unique = true;
                        query = child;
                    }
                    _ => break,
                }
            }

            if unique {
                return match elems.len() {
                    0 if nullable => Ok(Json::Null),
                    1 => self.run_value(mapping, query, elems.remove(0)).await,
                    found => Err(CoreError::UniqueViolation { field: path, found }),
                };
            }

            let mut values = Vec::with_capacity(elems.len());

            for elem in elems {
                values.push(self.run_value(mapping, query, elem).await?);
            }

            Ok(Json::Array(values))
        }
        .boxed()
    }

    fn run_fields<'a>(
        &'a self,
        mapping: &'a Arc<dyn Mapping>,
        query: &'a Query,
        cursor: CursorRef,
    ) -> BoxFuture<'a, CoreResult<Fields>> {
        async move {
            match query {
                Query::Group(queries) => {
                    let mut fields = Vec::new();

                    for query in queries {
                        fields.extend(self.run_fields(mapping, query, cursor.clone()).await?);
                    }

                    Ok(fields)
                }

                Query::Select(select) if select.name == "__typename" => Ok(vec![(
                    select.result_name().to_owned(),
                    Json::String(cursor.concrete_type_name()?),
                )]),

                Query::Select(select) => {
                    let tpe = cursor.concrete_type_name()?;

                    let value = match mapping.resolve_field(cursor.path(), &tpe, &select.name) {
                        FieldResolution::Cursor => {
                            let child = cursor.field(&select.name)?;
                            self.run_value(mapping, &select.child, child).await?
                        }
                        FieldResolution::Computed(f) => {
                            let value = f(cursor.as_ref())?;
                            let leaf_tpe = mapping
                                .schema()
                                .field(&tpe, &select.name)
                                .map(|f| f.tpe.underlying_name().to_owned())
                                .unwrap_or_default();

                            mapping.encode_leaf(&leaf_tpe, &value)?
                        }
                        FieldResolution::Delegated(delegate) => {
                            let joined = (delegate.join)(cursor.as_ref(), Query::Select(select.clone()))?;
                            self.run_delegated(&delegate, &tpe, joined).await?
                        }
                    };

                    Ok(vec![(select.result_name().to_owned(), value)])
                }

                Query::Component(component) => {
                    let Query::Select(select) = component.child.as_ref() else {
                        return Err(CoreError::interpreter(format!("Malformed component {query}")));
                    };

                    let resolution = mapping.resolve_field(cursor.path(), &component.type_name, &component.field_name);

                    let FieldResolution::Delegated(delegate) = resolution else {
                        return Err(CoreError::MissingFieldMapping {
                            field: component.field_name.clone(),
                            tpe: component.type_name.clone(),
                        });
                    };

                    let joined = (delegate.join)(cursor.as_ref(), Query::Select(select.clone()))?;
                    let value = self.run_delegated(&delegate, &component.type_name, joined).await?;

                    Ok(vec![(select.result_name().to_owned(), value)])
                }

                Query::Narrow(type_name, child) => {
                    if cursor.narrows_to(type_name) {
                        self.run_fields(mapping, child, cursor.narrow(type_name)?).await
                    } else {
                        Ok(Vec::new())
                    }
                }

                Query::Empty => Ok(Vec::new()),

                other => Err(CoreError::interpreter(format!(
                    "Unexpected {other} at object position '{}'",
                    cursor.path().join(".")
                ))),
            }
        }
        .boxed()
    }
}

fn is_list_operation(query: &Query) -> bool {
    matches!(
        query,
        Query::Filter(..) | Query::Unique(_) | Query::Limit(..) | Query::OrderBy(..)
    )
}
