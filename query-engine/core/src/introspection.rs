//! The introspection schema, served by a value mapping over a JSON rendition
//! of the user schema.

use crate::{CoreError, CoreResult, ValueField, ValueMapping, ValueRoot};
use query_structure::{Predicate, Query, Select, Term};
use query_value::Value;
use schema::{Field, InputValue, NamedType, Schema, SchemaRef, TypeRef};
use serde_json::{Map, Value as Json, json};
use std::sync::Arc;

const INTROSPECTION_SDL: &str = r#"
type Query {
  __schema: __Schema!
  __type(name: String!): __Type
}

type __Schema {
  description: String
  types: [__Type!]!
  queryType: __Type!
  mutationType: __Type
  subscriptionType: __Type
  directives: [__Directive!]!
}

type __Type {
  kind: __TypeKind!
  name: String
  description: String
  fields(includeDeprecated: Boolean = false): [__Field!]
  interfaces: [__Type!]
  possibleTypes: [__Type!]
  enumValues(includeDeprecated: Boolean = false): [__EnumValue!]
  inputFields: [__InputValue!]
  ofType: __Type
  specifiedByURL: String
}

type __Field {
  name: String!
  description: String
  args: [__InputValue!]!
  type: __Type!
  isDeprecated: Boolean!
  deprecationReason: String
}

type __InputValue {
  name: String!
  description: String
  type: __Type!
  defaultValue: String
}

type __EnumValue {
  name: String!
  description: String
  isDeprecated: Boolean!
  deprecationReason: String
}

enum __TypeKind {
  SCALAR
  OBJECT
  INTERFACE
  UNION
  ENUM
  INPUT_OBJECT
  LIST
  NON_NULL
}

type __Directive {
  name: String!
  description: String
  locations: [__DirectiveLocation!]!
  args: [__InputValue!]!
}

enum __DirectiveLocation {
  QUERY
  FIELD
  FRAGMENT_SPREAD
  INLINE_FRAGMENT
}
"#;

/// Parses the introspection schema.
pub fn introspection_schema() -> CoreResult<Schema> {
    Schema::parse(INTROSPECTION_SDL).map_err(|err| CoreError::elaboration(err.to_string()))
}

/// A mapping answering `__schema` and `__type` for the given schema.
pub fn introspection_mapping(target: &SchemaRef) -> CoreResult<ValueMapping> {
    let introspection = Arc::new(introspection_schema()?);
    let types: Vec<Json> = target.types().map(|t| type_json(target, t)).collect();

    let schema_json = json!({
        "description": null,
        "types": types.clone(),
        "queryType": named_ref(target, target.query_type()),
        "mutationType": null,
        "subscriptionType": null,
        "directives": directives(),
    });

    let object = |tpe: &str, fields: &[&str]| (tpe.to_owned(), ValueField::values(fields.iter().copied()));

    let objects = [
        object(
            "__Schema",
            &["description", "types", "queryType", "mutationType", "subscriptionType", "directives"],
        ),
        object(
            "__Type",
            &[
                "kind",
                "name",
                "description",
                "fields",
                "interfaces",
                "possibleTypes",
                "enumValues",
                "inputFields",
                "ofType",
                "specifiedByURL",
            ],
        ),
        object(
            "__Field",
            &["name", "description", "args", "type", "isDeprecated", "deprecationReason"],
        ),
        object("__InputValue", &["name", "description", "type", "defaultValue"]),
        object("__EnumValue", &["name", "description", "isDeprecated", "deprecationReason"]),
        object("__Directive", &["name", "description", "locations", "args"]),
    ];

    let builder = ValueMapping::builder(introspection).object(
        "Query",
        vec![
            ValueRoot::mapping("__schema", schema_json),
            ValueRoot::mapping("__type", Json::Array(types)),
        ],
    );

    let builder = objects
        .into_iter()
        .fold(builder, |builder, (tpe, fields)| builder.object(tpe, fields));

    Ok(builder.select_elaborator("Query", "__type", type_by_name).build())
}

/// `__type(name: ...)` selects the unique type with that name.
fn type_by_name(select: &Select) -> CoreResult<Query> {
    let name = match select.binding("name") {
        Some(Value::String(name)) => name.clone(),
        _ => return Err(CoreError::elaboration("Field '__type' requires a 'name' argument")),
    };

    let child = Query::unique(Query::filter(
        Predicate::eql(Term::field("name"), name),
        (*select.child).clone(),
    ));

    Ok(Query::Select(select.clone().with_child(child)))
}

fn type_json(schema: &Schema, tpe: &NamedType) -> Json {
    let mut object = Map::new();
    object.insert("kind".into(), json!(tpe.kind()));
    object.insert("name".into(), json!(tpe.name()));
    object.insert("description".into(), Json::Null);
    object.insert("specifiedByURL".into(), Json::Null);
    object.insert("ofType".into(), Json::Null);

    let fields = match tpe {
        NamedType::Object(_) | NamedType::Interface(_) => {
            json!(tpe.fields().iter().map(|f| field_json(schema, f)).collect::<Vec<_>>())
        }
        _ => Json::Null,
    };

    let interfaces = match tpe {
        NamedType::Object(_) | NamedType::Interface(_) => {
            json!(tpe.interfaces().iter().map(|i| named_ref(schema, i)).collect::<Vec<_>>())
        }
        _ => Json::Null,
    };

    let possible_types = if tpe.is_abstract() {
        json!(
            schema
                .possible_types(tpe.name())
                .into_iter()
                .map(|t| named_ref(schema, t))
                .collect::<Vec<_>>()
        )
    } else {
        Json::Null
    };

    let enum_values = match tpe {
        NamedType::Enum(e) => json!(
            e.values
                .iter()
                .map(|v| json!({
                    "name": v,
                    "description": null,
                    "isDeprecated": false,
                    "deprecationReason": null,
                }))
                .collect::<Vec<_>>()
        ),
        _ => Json::Null,
    };

    let input_fields = match tpe {
        NamedType::InputObject(i) => json!(i.fields.iter().map(|f| input_value_json(schema, f)).collect::<Vec<_>>()),
        _ => Json::Null,
    };

    object.insert("fields".into(), fields);
    object.insert("interfaces".into(), interfaces);
    object.insert("possibleTypes".into(), possible_types);
    object.insert("enumValues".into(), enum_values);
    object.insert("inputFields".into(), input_fields);

    Json::Object(object)
}

fn field_json(schema: &Schema, field: &Field) -> Json {
    json!({
        "name": field.name,
        "description": null,
        "args": field.args.iter().map(|a| input_value_json(schema, a)).collect::<Vec<_>>(),
        "type": type_ref_json(schema, &field.tpe),
        "isDeprecated": false,
        "deprecationReason": null,
    })
}

fn input_value_json(schema: &Schema, input: &InputValue) -> Json {
    json!({
        "name": input.name,
        "description": null,
        "type": type_ref_json(schema, &input.tpe),
        "defaultValue": input.default_value.as_ref().map(|v| v.to_string()),
    })
}

/// Wrapper types render as `NON_NULL` and `LIST` kinds around a reference to
/// the named type.
fn type_ref_json(schema: &Schema, tpe: &TypeRef) -> Json {
    match tpe {
        TypeRef::Nullable(inner) => match inner.as_ref() {
            TypeRef::Named(name) => named_ref(schema, name),
            TypeRef::List(item) => wrapper("LIST", type_ref_json(schema, item)),
            nested => type_ref_json(schema, nested),
        },
        TypeRef::Named(name) => wrapper("NON_NULL", named_ref(schema, name)),
        TypeRef::List(item) => wrapper("NON_NULL", wrapper("LIST", type_ref_json(schema, item))),
    }
}

fn wrapper(kind: &str, of_type: Json) -> Json {
    json!({
        "kind": kind,
        "name": null,
        "description": null,
        "fields": null,
        "interfaces": null,
        "possibleTypes": null,
        "enumValues": null,
        "inputFields": null,
        "ofType": of_type,
        "specifiedByURL": null,
    })
}

/// A reference to a named type. Only kind and name are filled in; the full
/// description of the type is available through `__schema.types` and
/// `__type(name: ...)`.
fn named_ref(schema: &Schema, name: &str) -> Json {
    let kind = schema.find_type(name).map(NamedType::kind).unwrap_or("SCALAR");

    json!({
        "kind": kind,
        "name": name,
        "description": null,
        "fields": null,
        "interfaces": null,
        "possibleTypes": null,
        "enumValues": null,
        "inputFields": null,
        "ofType": null,
        "specifiedByURL": null,
    })
}

fn directives() -> Json {
    let condition = json!([{
        "name": "if",
        "description": null,
        "type": wrapper("NON_NULL", json!({
            "kind": "SCALAR",
            "name": "Boolean",
            "description": null,
            "fields": null,
            "interfaces": null,
            "possibleTypes": null,
            "enumValues": null,
            "inputFields": null,
            "ofType": null,
            "specifiedByURL": null,
        })),
        "defaultValue": null,
    }]);

    json!([
        {
            "name": "skip",
            "description": null,
            "locations": ["FIELD", "FRAGMENT_SPREAD", "INLINE_FRAGMENT"],
            "args": condition,
        },
        {
            "name": "include",
            "description": null,
            "locations": ["FIELD", "FRAGMENT_SPREAD", "INLINE_FRAGMENT"],
            "args": condition,
        },
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn type_refs_wrap_named_references() {
        let schema = Schema::parse("type Query { cities(tags: [String!]): [City!]! }\ntype City { name: String }").unwrap();
        let field = schema.field("Query", "cities").unwrap();
        let rendered = type_ref_json(&schema, &field.tpe);

        assert_eq!(rendered["kind"], "NON_NULL");
        assert_eq!(rendered["ofType"]["kind"], "LIST");
        assert_eq!(rendered["ofType"]["ofType"]["kind"], "NON_NULL");
        assert_eq!(rendered["ofType"]["ofType"]["ofType"]["name"], "City");

        let arg = type_ref_json(&schema, &field.args[0].tpe);
        assert_eq!(arg["kind"], "LIST");
        assert_eq!(arg["ofType"]["ofType"]["name"], "String");
    }

    #[test]
    fn the_introspection_schema_parses() {
        let schema = introspection_schema().unwrap();

        assert!(schema.field("Query", "__type").is_some());
        assert!(schema.is_leaf("__TypeKind"));
    }
}
