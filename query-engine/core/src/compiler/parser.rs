use crate::{CoreError, CoreResult};
use graphql_parser::query::{
    Definition, Directive, Document, FragmentDefinition, OperationDefinition, Selection as GqlSelection, SelectionSet,
    TypeCondition, Value as GqlValue, VariableDefinition,
};
use query_structure::{Binding, Query, Select};
use query_value::Value;
use schema::convert_type;
use std::collections::HashMap;

/// Adapter from GraphQL text to the raw query algebra.
///
/// - Exactly one `query { ... }` or anonymous `{ ... }` operation is selected,
///   by name if one is given.
/// - Fields become `Select`s, aliases are kept when they differ from the name.
/// - Fragment spreads and inline fragments are inlined as `Narrow`s on their
///   type condition. The elaborator drops the ones that don't narrow.
/// - Variables are substituted, `@skip` and `@include` are applied.
///
/// Mutations and subscriptions are rejected.
pub(crate) struct GraphQLProtocolAdapter<'a, 'd> {
    fragments: HashMap<&'a str, &'a FragmentDefinition<'d, String>>,
    variables: HashMap<String, Value>,
}

pub(crate) fn parse(text: &str, operation_name: Option<&str>, variables: Option<&serde_json::Value>) -> CoreResult<Query> {
    let document: Document<'_, String> = graphql_parser::parse_query(text)
        .map_err(|err| CoreError::QueryParserError(err.to_string().trim_end().to_owned()))?;

    GraphQLProtocolAdapter::convert(&document, operation_name, variables)
}

impl<'a, 'd> GraphQLProtocolAdapter<'a, 'd> {
    fn convert(
        document: &'a Document<'d, String>,
        operation_name: Option<&str>,
        variables: Option<&serde_json::Value>,
    ) -> CoreResult<Query> {
        let fragments = document
            .definitions
            .iter()
            .filter_map(|def| match def {
                Definition::Fragment(f) => Some((f.name.as_str(), f)),
                Definition::Operation(_) => None,
            })
            .collect();

        let operation = Self::select_operation(document, operation_name)?;

        let (variable_definitions, selection_set) = match operation {
            OperationDefinition::SelectionSet(s) => (&[][..], s),
            OperationDefinition::Query(q) => (q.variable_definitions.as_slice(), &q.selection_set),
            OperationDefinition::Mutation(_) => {
                return Err(CoreError::QueryParserError("Mutations are not supported".into()));
            }
            OperationDefinition::Subscription(_) => {
                return Err(CoreError::QueryParserError("Subscriptions are not supported".into()));
            }
        };

        let adapter = GraphQLProtocolAdapter {
            fragments,
            variables: Self::bind_variables(variable_definitions, variables)?,
        };

        adapter.convert_selection_set(selection_set, &mut Vec::new())
    }

    fn select_operation(
        document: &'a Document<'d, String>,
        operation_name: Option<&str>,
    ) -> CoreResult<&'a OperationDefinition<'d, String>> {
        let mut operations = document.definitions.iter().filter_map(|def| match def {
            Definition::Operation(op) => Some(op),
            Definition::Fragment(_) => None,
        });

        match operation_name {
            Some(name) => operations
                .find(|op| Self::matches_operation(op, name))
                .ok_or_else(|| CoreError::QueryParserError(format!("Unknown operation named '{name}'"))),
            None => {
                let first = operations
                    .next()
                    .ok_or_else(|| CoreError::QueryParserError("At least one operation required".into()))?;

                if operations.next().is_some() {
                    return Err(CoreError::QueryParserError(
                        "Operation name required to select unique operation".into(),
                    ));
                }

                Ok(first)
            }
        }
    }

    /// Checks if the given GraphQL operation matches the operation name that should be executed.
    fn matches_operation(op: &OperationDefinition<'d, String>, operation: &str) -> bool {
        let check = |n: Option<&String>| n.is_some_and(|name| name == operation);

        match op {
            OperationDefinition::SelectionSet(_) => false,
            OperationDefinition::Query(q) => check(q.name.as_ref()),
            OperationDefinition::Mutation(m) => check(m.name.as_ref()),
            OperationDefinition::Subscription(s) => check(s.name.as_ref()),
        }
    }

    fn bind_variables(
        definitions: &[VariableDefinition<'d, String>],
        variables: Option<&serde_json::Value>,
    ) -> CoreResult<HashMap<String, Value>> {
        let mut bound = HashMap::new();

        for definition in definitions {
            let supplied = variables.and_then(|vars| vars.get(&definition.name));

            let value = match (supplied, &definition.default_value) {
                (Some(json), _) => Value::from_json(json).map_err(|err| {
                    CoreError::QueryParserError(format!("Invalid value for variable '{}': {err}", definition.name))
                })?,
                (None, Some(default)) => schema::value_from_ast(default),
                (None, None) if !convert_type(&definition.var_type).is_nullable() => {
                    return Err(CoreError::QueryParserError(format!(
                        "Value for required variable '{}' not provided",
                        definition.name
                    )));
                }
                (None, None) => Value::Absent,
            };

            bound.insert(definition.name.clone(), value);
        }

        Ok(bound)
    }

    fn convert_selection_set(
        &self,
        selection_set: &'a SelectionSet<'d, String>,
        visited: &mut Vec<&'a str>,
    ) -> CoreResult<Query> {
        let mut queries = Vec::with_capacity(selection_set.items.len());

        for item in &selection_set.items {
            match item {
                GqlSelection::Field(f) => {
                    if !self.is_included(&f.directives)? {
                        continue;
                    }

                    let bindings = f
                        .arguments
                        .iter()
                        .map(|(name, value)| Ok(Binding::new(name.clone(), self.convert_value(value)?)))
                        .collect::<CoreResult<Vec<_>>>()?;

                    let child = self.convert_selection_set(&f.selection_set, visited)?;
                    let alias = f.alias.clone().filter(|alias| alias != &f.name);

                    queries.push(Query::Select(
                        Select::new(f.name.clone(), child)
                            .with_alias(alias)
                            .with_bindings(bindings),
                    ));
                }

                GqlSelection::FragmentSpread(spread) => {
                    if !self.is_included(&spread.directives)? {
                        continue;
                    }

                    let name = spread.fragment_name.as_str();

                    let fragment: &'a FragmentDefinition<'d, String> = *self
                        .fragments
                        .get(name)
                        .ok_or_else(|| CoreError::QueryParserError(format!("Unknown fragment '{name}'")))?;

                    if visited.contains(&name) {
                        return Err(CoreError::QueryParserError(format!("Fragment cycle starting at '{name}'")));
                    }

                    visited.push(name);
                    let child = self.convert_selection_set(&fragment.selection_set, visited)?;
                    visited.pop();

                    let TypeCondition::On(type_name) = &fragment.type_condition;
                    queries.push(Query::narrow(type_name.clone(), child));
                }

                GqlSelection::InlineFragment(inline) => {
                    if !self.is_included(&inline.directives)? {
                        continue;
                    }

                    let child = self.convert_selection_set(&inline.selection_set, visited)?;

                    match &inline.type_condition {
                        Some(TypeCondition::On(type_name)) => queries.push(Query::narrow(type_name.clone(), child)),
                        None => queries.push(child),
                    }
                }
            }
        }

        Ok(Query::group(queries))
    }

    /// Applies `@skip(if:)` and `@include(if:)`.
    fn is_included(&self, directives: &[Directive<'d, String>]) -> CoreResult<bool> {
        for directive in directives {
            let expected = match directive.name.as_str() {
                "skip" => false,
                "include" => true,
                _ => continue,
            };

            let condition = directive
                .arguments
                .iter()
                .find(|(name, _)| name == "if")
                .map(|(_, value)| self.convert_value(value))
                .transpose()?;

            match condition {
                Some(Value::Boolean(b)) if b != expected => return Ok(false),
                Some(Value::Boolean(_)) => (),
                _ => {
                    return Err(CoreError::QueryParserError(format!(
                        "Directive '@{}' requires a Boolean argument 'if'",
                        directive.name
                    )));
                }
            }
        }

        Ok(true)
    }

    fn convert_value(&self, value: &GqlValue<'d, String>) -> CoreResult<Value> {
        match value {
            GqlValue::Variable(name) => self
                .variables
                .get(name)
                .cloned()
                .ok_or_else(|| CoreError::QueryParserError(format!("Variable '{name}' is not defined"))),
            GqlValue::List(values) => Ok(Value::List(
                values.iter().map(|v| self.convert_value(v)).collect::<CoreResult<_>>()?,
            )),
            GqlValue::Object(fields) => Ok(Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| Ok((k.clone(), self.convert_value(v)?)))
                    .collect::<CoreResult<_>>()?,
            )),
            literal => Ok(schema::value_from_ast(literal)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn fragments_become_narrows() {
        let query = parse(
            "query { items { ...A ... on ItemB { itemb } } } fragment A on ItemA { itema }",
            None,
            None,
        )
        .unwrap();

        let expected = Query::select(
            "items",
            Query::Group(vec![
                Query::narrow("ItemA", Query::field("itema")),
                Query::narrow("ItemB", Query::field("itemb")),
            ]),
        );

        assert_eq!(query, expected);
    }

    #[test]
    fn variables_and_directives_are_applied() {
        let vars = json!({ "pattern": "Linh%", "withId": false });
        let query = parse(
            "query Q($pattern: String!, $withId: Boolean!) { cities(namePattern: $pattern) { id @include(if: $withId) name } }",
            Some("Q"),
            Some(&vars),
        )
        .unwrap();

        let expected = Query::Select(
            Select::new("cities", Query::field("name")).with_bindings(vec![Binding::new("namePattern", "Linh%")]),
        );

        assert_eq!(query, expected);
    }

    #[test]
    fn missing_required_variable_is_an_error() {
        let err = parse("query ($id: Int!) { city(id: $id) { name } }", None, None).unwrap_err();

        assert_eq!(err.to_string(), "Value for required variable 'id' not provided");
    }

    #[test]
    fn ambiguous_operations_are_rejected() {
        let err = parse("query A { a } query B { b }", None, None).unwrap_err();

        assert_eq!(err.to_string(), "Operation name required to select unique operation");
        assert!(parse("query A { a } query B { b }", Some("B"), None).is_ok());
    }

    #[test]
    fn mutations_are_rejected() {
        let err = parse("mutation { a }", None, None).unwrap_err();

        assert_eq!(err.to_string(), "Mutations are not supported");
    }
}
