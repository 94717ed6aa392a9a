//! A mapping backend over in-memory JSON values.
//!
//! Objects are JSON objects, lists are JSON arrays and abstract types carry
//! their concrete type in a `__typename` member.

use crate::{
    BackendField, CoreError, CoreResult, Cursor, CursorRef, FieldMapping, MappingBuilder, MappingRegistry, RootCursor,
    RootMapping, RootQuery, cursor::mismatch,
};
use async_trait::async_trait;
use query_structure::Query;
use query_value::Value;
use schema::{NamedType, SchemaRef, TypeRef};
use serde_json::Value as Json;
use std::{fmt, sync::Arc};

pub type ValueMapping = MappingRegistry<ValueField>;

pub type ValueMappingBuilder = MappingBuilder<ValueField>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueField {
    /// Read from the member named like the field.
    Value { field_name: String },
    /// Read from a differently named member.
    Key { field_name: String, key: String },
    /// A hidden member, only available as a cursor attribute.
    Attribute { field_name: String, key: String },
}

impl ValueField {
    pub fn value(field_name: impl Into<String>) -> FieldMapping<ValueField> {
        FieldMapping::Backend(ValueField::Value {
            field_name: field_name.into(),
        })
    }

    pub fn key(field_name: impl Into<String>, key: impl Into<String>) -> FieldMapping<ValueField> {
        FieldMapping::Backend(ValueField::Key {
            field_name: field_name.into(),
            key: key.into(),
        })
    }

    pub fn attribute(field_name: impl Into<String>, key: impl Into<String>) -> FieldMapping<ValueField> {
        FieldMapping::Backend(ValueField::Attribute {
            field_name: field_name.into(),
            key: key.into(),
        })
    }

    /// Plain value fields for each name.
    pub fn values<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<FieldMapping<ValueField>> {
        names.into_iter().map(ValueField::value).collect()
    }

    /// The JSON member the field is read from.
    pub fn key_name(&self) -> &str {
        match self {
            ValueField::Value { field_name } => field_name,
            ValueField::Key { key, .. } | ValueField::Attribute { key, .. } => key,
        }
    }
}

impl BackendField for ValueField {
    fn field_name(&self) -> &str {
        match self {
            ValueField::Value { field_name }
            | ValueField::Key { field_name, .. }
            | ValueField::Attribute { field_name, .. } => field_name,
        }
    }

    fn hidden(&self) -> bool {
        matches!(self, ValueField::Attribute { .. })
    }
}

/// A root field over a fixed JSON value.
pub struct ValueRoot {
    json: Arc<Json>,
}

impl ValueRoot {
    pub fn new(json: Json) -> Self {
        ValueRoot { json: Arc::new(json) }
    }

    pub fn mapping(field_name: impl Into<String>, json: Json) -> FieldMapping<ValueField> {
        FieldMapping::Root(RootMapping::new(field_name, ValueRoot::new(json)))
    }
}

#[async_trait]
impl RootCursor<ValueField> for ValueRoot {
    async fn run(&self, mapping: &ValueMapping, query: RootQuery<'_>) -> CoreResult<(Query, CursorRef)> {
        let cursor = JsonCursor {
            mapping: mapping.clone(),
            path: vec![query.field_name.to_owned()],
            tpe: query.tpe.clone(),
            json: Arc::clone(&self.json),
        };

        Ok((query.child.clone(), Arc::new(cursor)))
    }
}

#[derive(Clone)]
pub struct JsonCursor {
    mapping: ValueMapping,
    path: Vec<String>,
    tpe: TypeRef,
    json: Arc<Json>,
}

impl fmt::Debug for JsonCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonCursor")
            .field("path", &self.path)
            .field("tpe", &self.tpe)
            .field("json", &self.json)
            .finish()
    }
}

impl JsonCursor {
    fn schema(&self) -> &SchemaRef {
        self.mapping.schema()
    }

    fn with(&self, tpe: TypeRef, json: Arc<Json>) -> CursorRef {
        Arc::new(JsonCursor {
            mapping: self.mapping.clone(),
            path: self.path.clone(),
            tpe,
            json,
        })
    }

    fn member(&self, key: &str) -> Json {
        self.json.get(key).cloned().unwrap_or(Json::Null)
    }

    fn mapped_field(&self, field_name: &str) -> CoreResult<ValueField> {
        let tpe = self.concrete_type_name()?;

        self.mapping
            .backend_field(&self.path, &tpe, field_name)
            .filter(|field| !field.hidden())
            .cloned()
            .ok_or_else(|| CoreError::MissingFieldMapping {
                field: field_name.to_owned(),
                tpe,
            })
    }
}

impl Cursor for JsonCursor {
    fn path(&self) -> &[String] {
        &self.path
    }

    fn tpe(&self) -> &TypeRef {
        &self.tpe
    }

    fn concrete_type_name(&self) -> CoreResult<String> {
        let declared = self.tpe.underlying_name();

        if !self.schema().is_abstract(declared) {
            return Ok(declared.to_owned());
        }

        match self.json.get("__typename").and_then(Json::as_str) {
            Some(name) => Ok(name.to_owned()),
            None => Err(CoreError::interpreter(format!(
                "Value of abstract type '{declared}' at '{}' has no __typename",
                self.path.join(".")
            ))),
        }
    }

    fn is_leaf(&self) -> bool {
        matches!(&self.tpe, TypeRef::Named(name) if self.schema().is_leaf(name))
    }

    fn as_leaf(&self) -> CoreResult<Value> {
        if !self.is_leaf() {
            return Err(mismatch(self, "a leaf"));
        }

        let value = Value::from_json(&self.json).map_err(|err| CoreError::interpreter(err.to_string()))?;
        let name = self.tpe.underlying_name();

        Ok(match (value, self.schema().find_type(name)) {
            (Value::String(s), Some(NamedType::Enum(_))) => Value::Enum(s),
            (Value::String(s), _) if name == "ID" => Value::Id(s),
            (Value::Int(i), _) if name == "ID" => Value::Id(i.to_string()),
            (Value::Int(i), _) if name == "Float" => Value::Float(i as f64),
            (value, _) => value,
        })
    }

    fn as_list(&self) -> CoreResult<Vec<CursorRef>> {
        let item = self.tpe.item().unwrap_or_else(|| self.tpe.non_null()).clone();

        Ok(match self.json.as_ref() {
            Json::Array(elems) => elems
                .iter()
                .map(|elem| self.with(item.clone(), Arc::new(elem.clone())))
                .collect(),
            Json::Null => Vec::new(),
            _ => vec![self.with(item, Arc::clone(&self.json))],
        })
    }

    fn as_nullable(&self) -> CoreResult<Option<CursorRef>> {
        match &self.tpe {
            TypeRef::Nullable(_) if self.json.is_null() => Ok(None),
            TypeRef::Nullable(inner) => Ok(Some(self.with(inner.as_ref().clone(), Arc::clone(&self.json)))),
            _ => Err(mismatch(self, "a nullable value")),
        }
    }

    fn narrows_to(&self, type_name: &str) -> bool {
        self.concrete_type_name()
            .is_ok_and(|concrete| self.schema().is_subtype(&concrete, type_name))
    }

    fn narrow(&self, type_name: &str) -> CoreResult<CursorRef> {
        if !self.narrows_to(type_name) {
            return Err(mismatch(self, type_name));
        }

        Ok(self.with(TypeRef::named(type_name), Arc::clone(&self.json)))
    }

    fn has_field(&self, field_name: &str) -> bool {
        self.mapped_field(field_name)
            .is_ok_and(|field| self.json.get(field.key_name()).is_some())
    }

    fn field(&self, field_name: &str) -> CoreResult<CursorRef> {
        let tpe = self.concrete_type_name()?;
        let field = self.mapped_field(field_name)?;

        let field_tpe = self
            .schema()
            .field(&tpe, field_name)
            .map(|f| f.tpe.clone())
            .ok_or_else(|| CoreError::UnknownField {
                field: field_name.to_owned(),
                tpe: tpe.clone(),
            })?;

        let mut path = self.path.clone();
        path.push(field_name.to_owned());

        Ok(Arc::new(JsonCursor {
            mapping: self.mapping.clone(),
            path,
            tpe: field_tpe,
            json: Arc::new(self.member(field.key_name())),
        }))
    }

    fn has_attribute(&self, attribute: &str) -> bool {
        self.attribute(attribute).is_ok()
    }

    fn attribute(&self, attribute: &str) -> CoreResult<Value> {
        let tpe = self.concrete_type_name()?;

        self.mapping.attribute(self, &tpe, attribute, |field| {
            Value::from_json(&self.member(field.key_name())).map_err(|err| CoreError::interpreter(err.to_string()))
        })
    }
}
