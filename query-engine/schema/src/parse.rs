//! Conversion of SDL documents into the schema model.

use crate::*;
use graphql_parser::{query as gql, schema as sdl};
use indexmap::IndexMap;
use query_value::Value;

pub(crate) fn parse_schema(text: &str) -> SchemaResult<Schema> {
    let document = sdl::parse_schema::<String>(text).map_err(|err| SchemaError::Parse(err.to_string()))?;
    let mut types: IndexMap<String, NamedType> = IndexMap::new();
    let mut query_type = None;

    for name in BUILTIN_SCALARS {
        types.insert(name.to_owned(), NamedType::Scalar(name.to_owned()));
    }

    for definition in document.definitions {
        let tpe = match definition {
            sdl::Definition::SchemaDefinition(schema) => {
                query_type = schema.query;
                continue;
            }
            sdl::Definition::TypeDefinition(tpe) => convert_type_definition(tpe),
            // Extensions and directive definitions don't affect query execution.
            sdl::Definition::TypeExtension(_) | sdl::Definition::DirectiveDefinition(_) => continue,
        };

        let name = tpe.name().to_owned();

        if types.contains_key(&name) && !BUILTIN_SCALARS.contains(&name.as_str()) {
            return Err(SchemaError::DuplicateType(name));
        }

        types.insert(name, tpe);
    }

    let query_type = query_type.unwrap_or_else(|| "Query".to_owned());
    let schema = Schema::new(types, query_type);

    schema.check_references()?;

    Ok(schema)
}

fn convert_type_definition(definition: sdl::TypeDefinition<'_, String>) -> NamedType {
    match definition {
        sdl::TypeDefinition::Scalar(s) => NamedType::Scalar(s.name),
        sdl::TypeDefinition::Object(o) => NamedType::Object(ObjectType {
            name: o.name,
            fields: o.fields.iter().map(convert_field).collect(),
            interfaces: o.implements_interfaces,
        }),
        sdl::TypeDefinition::Interface(i) => NamedType::Interface(ObjectType {
            name: i.name,
            fields: i.fields.iter().map(convert_field).collect(),
            interfaces: i.implements_interfaces,
        }),
        sdl::TypeDefinition::Union(u) => NamedType::Union(UnionType {
            name: u.name,
            members: u.types,
        }),
        sdl::TypeDefinition::Enum(e) => NamedType::Enum(EnumType {
            name: e.name,
            values: e.values.into_iter().map(|v| v.name).collect(),
        }),
        sdl::TypeDefinition::InputObject(i) => NamedType::InputObject(InputObjectType {
            name: i.name,
            fields: i.fields.iter().map(convert_input_value).collect(),
        }),
    }
}

fn convert_field(field: &sdl::Field<'_, String>) -> Field {
    Field {
        name: field.name.clone(),
        args: field.arguments.iter().map(convert_input_value).collect(),
        tpe: convert_type(&field.field_type),
    }
}

fn convert_input_value(input: &sdl::InputValue<'_, String>) -> InputValue {
    InputValue {
        name: input.name.clone(),
        tpe: convert_type(&input.value_type),
        default_value: input.default_value.as_ref().map(value_from_ast),
    }
}

/// Converts a GraphQL AST type into a `TypeRef`, making nullability explicit.
pub fn convert_type(tpe: &gql::Type<'_, String>) -> TypeRef {
    fn non_null(tpe: &gql::Type<'_, String>) -> TypeRef {
        match tpe {
            gql::Type::NamedType(name) => TypeRef::Named(name.clone()),
            gql::Type::ListType(item) => TypeRef::list(convert_type(item)),
            gql::Type::NonNullType(inner) => non_null(inner),
        }
    }

    match tpe {
        gql::Type::NonNullType(inner) => non_null(inner),
        other => non_null(other).nullable(),
    }
}

/// Converts a GraphQL AST value literal. Variables are kept as references.
pub fn value_from_ast(value: &gql::Value<'_, String>) -> Value {
    match value {
        gql::Value::Variable(name) => Value::Variable(name.clone()),
        gql::Value::Int(n) => n.as_i64().map(Value::Int).unwrap_or(Value::Null),
        gql::Value::Float(f) => Value::Float(*f),
        gql::Value::String(s) => Value::String(s.clone()),
        gql::Value::Boolean(b) => Value::Boolean(*b),
        gql::Value::Null => Value::Null,
        gql::Value::Enum(e) => Value::Enum(e.clone()),
        gql::Value::List(values) => Value::List(values.iter().map(value_from_ast).collect()),
        gql::Value::Object(fields) => {
            Value::Object(fields.iter().map(|(k, v)| (k.clone(), value_from_ast(v))).collect())
        }
    }
}
