use query_value::Value;
use std::fmt;

/// A reference to a type from a field or argument position.
///
/// Nullability is an explicit wrapper: the GraphQL type `T` is
/// `Nullable(Named("T"))` while `T!` is plain `Named("T")`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Named(String),
    List(Box<TypeRef>),
    Nullable(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(name.into())
    }

    pub fn list(item: TypeRef) -> Self {
        TypeRef::List(Box::new(item))
    }

    pub fn nullable(self) -> Self {
        match self {
            TypeRef::Nullable(_) => self,
            other => TypeRef::Nullable(Box::new(other)),
        }
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, TypeRef::Nullable(_))
    }

    pub fn is_list(&self) -> bool {
        matches!(self.non_null(), TypeRef::List(_))
    }

    /// Strips one level of nullability, if present.
    pub fn non_null(&self) -> &TypeRef {
        match self {
            TypeRef::Nullable(inner) => inner,
            other => other,
        }
    }

    /// The element type of a (possibly nullable) list.
    pub fn item(&self) -> Option<&TypeRef> {
        match self.non_null() {
            TypeRef::List(item) => Some(item),
            _ => None,
        }
    }

    /// The name of the named type at the bottom of all wrappers.
    pub fn underlying_name(&self) -> &str {
        match self {
            TypeRef::Named(name) => name,
            TypeRef::List(inner) | TypeRef::Nullable(inner) => inner.underlying_name(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_inner(tpe: &TypeRef, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match tpe {
                TypeRef::Named(name) => f.write_str(name),
                TypeRef::List(item) => write!(f, "[{item}]"),
                TypeRef::Nullable(inner) => write_inner(inner, f),
            }
        }

        write_inner(self, f)?;

        if !self.is_nullable() {
            f.write_str("!")?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub args: Vec<InputValue>,
    pub tpe: TypeRef,
}

impl Field {
    pub fn new(name: impl Into<String>, tpe: TypeRef) -> Self {
        Field {
            name: name.into(),
            args: Vec::new(),
            tpe,
        }
    }

    pub fn arg(&self, name: &str) -> Option<&InputValue> {
        self.args.iter().find(|a| a.name == name)
    }
}

/// An argument of a field or a field of an input object type.
#[derive(Debug, Clone, PartialEq)]
pub struct InputValue {
    pub name: String,
    pub tpe: TypeRef,
    pub default_value: Option<Value>,
}

impl InputValue {
    /// Required inputs are non-null and have no default.
    pub fn is_required(&self) -> bool {
        !self.tpe.is_nullable() && self.default_value.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectType {
    pub name: String,
    pub fields: Vec<Field>,
    pub interfaces: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnionType {
    pub name: String,
    pub members: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    pub name: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputObjectType {
    pub name: String,
    pub fields: Vec<InputValue>,
}

impl InputObjectType {
    pub fn field(&self, name: &str) -> Option<&InputValue> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NamedType {
    Scalar(String),
    Object(ObjectType),
    Interface(ObjectType),
    Union(UnionType),
    Enum(EnumType),
    InputObject(InputObjectType),
}

impl NamedType {
    pub fn name(&self) -> &str {
        match self {
            NamedType::Scalar(name) => name,
            NamedType::Object(o) | NamedType::Interface(o) => &o.name,
            NamedType::Union(u) => &u.name,
            NamedType::Enum(e) => &e.name,
            NamedType::InputObject(i) => &i.name,
        }
    }

    /// Introspection kind of the type.
    pub fn kind(&self) -> &'static str {
        match self {
            NamedType::Scalar(_) => "SCALAR",
            NamedType::Object(_) => "OBJECT",
            NamedType::Interface(_) => "INTERFACE",
            NamedType::Union(_) => "UNION",
            NamedType::Enum(_) => "ENUM",
            NamedType::InputObject(_) => "INPUT_OBJECT",
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, NamedType::Scalar(_) | NamedType::Enum(_))
    }

    pub fn is_abstract(&self) -> bool {
        matches!(self, NamedType::Interface(_) | NamedType::Union(_))
    }

    pub fn fields(&self) -> &[Field] {
        match self {
            NamedType::Object(o) | NamedType::Interface(o) => &o.fields,
            _ => &[],
        }
    }

    pub fn interfaces(&self) -> &[String] {
        match self {
            NamedType::Object(o) | NamedType::Interface(o) => &o.interfaces,
            _ => &[],
        }
    }

    pub fn as_enum(&self) -> Option<&EnumType> {
        match self {
            NamedType::Enum(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_input_object(&self) -> Option<&InputObjectType> {
        match self {
            NamedType::InputObject(i) => Some(i),
            _ => None,
        }
    }
}
