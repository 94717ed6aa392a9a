#![deny(rust_2018_idioms, unsafe_code)]

mod error;
mod parse;
mod types;

pub use error::*;
pub use parse::{convert_type, value_from_ast};
pub use types::*;

use indexmap::IndexMap;
use std::sync::Arc;

pub type SchemaRef = Arc<Schema>;

pub const BUILTIN_SCALARS: [&str; 5] = ["Int", "Float", "String", "Boolean", "ID"];

/// The immutable type system a mapping is declared against.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    types: IndexMap<String, NamedType>,
    query_type: String,
}

impl Schema {
    /// Parses schema definition language text. The query root is taken from a
    /// `schema { query: ... }` definition, defaulting to `Query`.
    pub fn parse(sdl: &str) -> SchemaResult<Schema> {
        parse::parse_schema(sdl)
    }

    pub(crate) fn new(types: IndexMap<String, NamedType>, query_type: String) -> Self {
        Schema { types, query_type }
    }

    pub fn query_type(&self) -> &str {
        &self.query_type
    }

    pub fn types(&self) -> impl Iterator<Item = &NamedType> {
        self.types.values()
    }

    pub fn find_type(&self, name: &str) -> Option<&NamedType> {
        self.types.get(name)
    }

    pub fn has_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Finds a field declared on an object or interface type. Fields not
    /// redeclared on an object are looked up on its interfaces.
    pub fn field(&self, type_name: &str, field_name: &str) -> Option<&Field> {
        let tpe = self.find_type(type_name)?;

        tpe.fields()
            .iter()
            .find(|f| f.name == field_name)
            .or_else(|| tpe.interfaces().iter().find_map(|i| self.field(i, field_name)))
    }

    pub fn is_leaf(&self, name: &str) -> bool {
        self.find_type(name).is_some_and(NamedType::is_leaf)
    }

    pub fn is_abstract(&self, name: &str) -> bool {
        self.find_type(name).is_some_and(NamedType::is_abstract)
    }

    /// True if `sub` is `sup`, implements it (transitively) or is a member of
    /// the union `sup`.
    pub fn is_subtype(&self, sub: &str, sup: &str) -> bool {
        if sub == sup {
            return true;
        }

        if let Some(NamedType::Union(union)) = self.find_type(sup) {
            if union.members.iter().any(|m| m == sub) {
                return true;
            }
        }

        self.find_type(sub)
            .map(|t| t.interfaces().iter().any(|i| self.is_subtype(i, sup)))
            .unwrap_or(false)
    }

    /// All object types an abstract type can resolve to at runtime, in
    /// declaration order. An object type is its own single possible type.
    pub fn possible_types(&self, name: &str) -> Vec<&str> {
        match self.find_type(name) {
            Some(NamedType::Object(o)) => vec![o.name.as_str()],
            Some(NamedType::Union(u)) => u.members.iter().map(String::as_str).collect(),
            Some(NamedType::Interface(_)) => self
                .types
                .values()
                .filter(|t| matches!(t, NamedType::Object(_)) && self.is_subtype(t.name(), name))
                .map(NamedType::name)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Checks that every type referenced from a field, argument, interface
    /// list or union is declared.
    pub(crate) fn check_references(&self) -> SchemaResult<()> {
        if !self.has_type(&self.query_type) {
            return Err(SchemaError::MissingQueryType(self.query_type.clone()));
        }

        let check = |owner: &str, referenced: &str| {
            if self.has_type(referenced) {
                Ok(())
            } else {
                Err(SchemaError::UnknownType {
                    owner: owner.to_owned(),
                    referenced: referenced.to_owned(),
                })
            }
        };

        for tpe in self.types.values() {
            match tpe {
                NamedType::Object(o) | NamedType::Interface(o) => {
                    for interface in &o.interfaces {
                        check(&o.name, interface)?;
                    }

                    for field in &o.fields {
                        let owner = format!("{}.{}", o.name, field.name);
                        check(&owner, field.tpe.underlying_name())?;

                        for arg in &field.args {
                            check(&owner, arg.tpe.underlying_name())?;
                        }
                    }
                }
                NamedType::Union(u) => {
                    for member in &u.members {
                        check(&u.name, member)?;
                    }
                }
                NamedType::InputObject(i) => {
                    for field in &i.fields {
                        check(&format!("{}.{}", i.name, field.name), field.tpe.underlying_name())?;
                    }
                }
                NamedType::Scalar(_) | NamedType::Enum(_) => (),
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use query_value::Value;

    const SDL: &str = indoc! {r#"
        type Query {
          node: Node
          items: [Item!]!
          cities(namePattern: String = "%", filter: CityFilter): [City!]!
        }
        interface Node { id: ID! }
        type City implements Node { id: ID! name: String! }
        type ItemA { itema: String! }
        type ItemB { itemb: String! }
        union Item = ItemA | ItemB
        input CityFilter { name: String, limit: Int = 10 }
    "#};

    #[test]
    fn parses_types_and_defaults() {
        let schema = Schema::parse(SDL).unwrap();
        let cities = schema.field("Query", "cities").unwrap();

        assert_eq!(schema.query_type(), "Query");
        assert_eq!(cities.tpe, TypeRef::list(TypeRef::named("City")));
        assert_eq!(
            cities.arg("namePattern").unwrap().default_value,
            Some(Value::String("%".into()))
        );
        assert!(!cities.arg("filter").unwrap().is_required());
    }

    #[test]
    fn subtyping_covers_interfaces_and_unions() {
        let schema = Schema::parse(SDL).unwrap();

        assert!(schema.is_subtype("City", "Node"));
        assert!(schema.is_subtype("ItemB", "Item"));
        assert!(!schema.is_subtype("ItemB", "Node"));
        assert_eq!(schema.possible_types("Item"), vec!["ItemA", "ItemB"]);
        assert_eq!(schema.possible_types("Node"), vec!["City"]);
    }

    #[test]
    fn interface_fields_are_visible_on_implementors() {
        let schema = Schema::parse("type Query { a: A } interface N { id: ID! } type A implements N { x: Int }").unwrap();

        assert_eq!(schema.field("A", "id").map(|f| f.name.as_str()), Some("id"));
    }

    #[test]
    fn dangling_references_are_rejected() {
        let err = Schema::parse("type Query { a: Missing }").unwrap_err();

        assert_eq!(
            err,
            SchemaError::UnknownType {
                owner: "Query.a".into(),
                referenced: "Missing".into()
            }
        );
    }
}
