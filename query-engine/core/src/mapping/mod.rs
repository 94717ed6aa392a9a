//! Declarations of how schema types and fields resolve against a backend.

mod registry;
mod validation;

pub use registry::*;
pub use validation::*;

use crate::{CoreResult, Cursor, CursorRef};
use async_trait::async_trait;
use query_structure::{Binding, Query, Select};
use query_value::Value;
use schema::{SchemaRef, TypeRef};
use std::{fmt, sync::Arc};

/// Computes a value from the cursor of the enclosing object.
pub type CursorFieldFn = Arc<dyn Fn(&dyn Cursor) -> CoreResult<Value> + Send + Sync>;

/// Turns the parent cursor and the delegated select into the query the
/// delegated mapping runs.
pub type JoinFn = Arc<dyn Fn(&dyn Cursor, Query) -> CoreResult<Query> + Send + Sync>;

/// Serializes a leaf value of one scalar or enum type.
pub type Encoder = Arc<dyn Fn(&Value) -> CoreResult<serde_json::Value> + Send + Sync>;

/// Rewrites an elaborated select of one `(type, field)`, e.g. turning
/// arguments into filters.
pub type SelectElaborator = Arc<dyn Fn(&Select) -> CoreResult<Query> + Send + Sync>;

/// The variant set backends extend field mappings with.
pub trait BackendField: fmt::Debug + Send + Sync + 'static {
    fn field_name(&self) -> &str;

    /// Hidden fields are not part of the schema.
    fn hidden(&self) -> bool {
        false
    }

    /// Sibling fields whose values this field reads.
    fn required(&self) -> &[String] {
        &[]
    }
}

pub enum TypeMapping<X> {
    Object(ObjectMapping<X>),
    Leaf(LeafMapping),
    Prefixed(PrefixedMapping<X>),
}

impl<X> TypeMapping<X> {
    pub fn tpe(&self) -> &str {
        match self {
            TypeMapping::Object(o) => &o.tpe,
            TypeMapping::Leaf(l) => &l.tpe,
            TypeMapping::Prefixed(p) => &p.tpe,
        }
    }
}

pub struct ObjectMapping<X> {
    pub tpe: String,
    pub field_mappings: Vec<FieldMapping<X>>,
}

impl<X: BackendField> ObjectMapping<X> {
    pub fn new(tpe: impl Into<String>, field_mappings: Vec<FieldMapping<X>>) -> Self {
        ObjectMapping {
            tpe: tpe.into(),
            field_mappings,
        }
    }

    pub fn field_mapping(&self, name: &str) -> Option<&FieldMapping<X>> {
        self.field_mappings.iter().find(|fm| fm.field_name() == name)
    }
}

pub struct LeafMapping {
    pub tpe: String,
    pub encoder: Encoder,
}

impl LeafMapping {
    pub fn new<F>(tpe: impl Into<String>, encoder: F) -> Self
    where
        F: Fn(&Value) -> CoreResult<serde_json::Value> + Send + Sync + 'static,
    {
        LeafMapping {
            tpe: tpe.into(),
            encoder: Arc::new(encoder),
        }
    }
}

/// Object mappings of one type scoped by the path they are reached through.
pub struct PrefixedMapping<X> {
    pub tpe: String,
    pub mappings: Vec<(Vec<String>, ObjectMapping<X>)>,
}

pub enum FieldMapping<X> {
    Root(RootMapping<X>),
    Delegate(Delegate),
    CursorField(CursorField),
    CursorAttribute(CursorAttribute),
    Backend(X),
}

impl<X: BackendField> FieldMapping<X> {
    pub fn field_name(&self) -> &str {
        match self {
            FieldMapping::Root(r) => &r.field_name,
            FieldMapping::Delegate(d) => &d.field_name,
            FieldMapping::CursorField(c) => &c.field_name,
            FieldMapping::CursorAttribute(c) => &c.field_name,
            FieldMapping::Backend(x) => x.field_name(),
        }
    }

    pub fn hidden(&self) -> bool {
        match self {
            FieldMapping::CursorAttribute(_) => true,
            FieldMapping::CursorField(c) => c.hidden,
            FieldMapping::Backend(x) => x.hidden(),
            FieldMapping::Root(_) | FieldMapping::Delegate(_) => false,
        }
    }

    pub fn required(&self) -> &[String] {
        match self {
            FieldMapping::CursorField(c) => &c.required,
            FieldMapping::CursorAttribute(c) => &c.required,
            FieldMapping::Backend(x) => x.required(),
            FieldMapping::Root(_) | FieldMapping::Delegate(_) => &[],
        }
    }

    pub fn as_backend(&self) -> Option<&X> {
        match self {
            FieldMapping::Backend(x) => Some(x),
            _ => None,
        }
    }
}

/// The arguments a root mapping runs with.
#[derive(Debug, Clone, Copy)]
pub struct RootQuery<'a> {
    pub field_name: &'a str,
    pub alias: Option<&'a str>,
    pub bindings: &'a [Binding],
    pub tpe: &'a TypeRef,
    /// The child of the root select, including any filters on it.
    pub child: &'a Query,
}

impl RootQuery<'_> {
    /// The root select this query was built from.
    pub fn to_query(&self) -> Query {
        Query::Select(
            Select::new(self.field_name, self.child.clone())
                .with_alias(self.alias.map(str::to_owned))
                .with_bindings(self.bindings.to_vec()),
        )
    }
}

/// Produces the initial cursor for a top level field.
#[async_trait]
pub trait RootCursor<X>: Send + Sync {
    /// Returns the cursor together with the part of the child query which
    /// still has to be interpreted over it.
    async fn run(&self, mapping: &MappingRegistry<X>, query: RootQuery<'_>) -> CoreResult<(Query, CursorRef)>;
}

pub struct RootMapping<X> {
    pub field_name: String,
    pub root: Arc<dyn RootCursor<X>>,
}

impl<X> RootMapping<X> {
    pub fn new(field_name: impl Into<String>, root: impl RootCursor<X> + 'static) -> Self {
        RootMapping {
            field_name: field_name.into(),
            root: Arc::new(root),
        }
    }
}

#[derive(Clone)]
pub struct Delegate {
    pub field_name: String,
    pub mapping: Arc<dyn Mapping>,
    pub join: JoinFn,
}

impl Delegate {
    pub fn new<F>(field_name: impl Into<String>, mapping: Arc<dyn Mapping>, join: F) -> Self
    where
        F: Fn(&dyn Cursor, Query) -> CoreResult<Query> + Send + Sync + 'static,
    {
        Delegate {
            field_name: field_name.into(),
            mapping,
            join: Arc::new(join),
        }
    }

    /// Delegation without any dependency on the parent.
    pub fn trivial(field_name: impl Into<String>, mapping: Arc<dyn Mapping>) -> Self {
        Delegate::new(field_name, mapping, |_, child| Ok(child))
    }
}

pub struct CursorField {
    pub field_name: String,
    pub f: CursorFieldFn,
    pub required: Vec<String>,
    pub hidden: bool,
}

impl CursorField {
    pub fn new<F>(field_name: impl Into<String>, required: Vec<String>, f: F) -> Self
    where
        F: Fn(&dyn Cursor) -> CoreResult<Value> + Send + Sync + 'static,
    {
        CursorField {
            field_name: field_name.into(),
            f: Arc::new(f),
            required,
            hidden: false,
        }
    }
}

/// Like `CursorField`, but never visible in the schema.
pub struct CursorAttribute {
    pub field_name: String,
    pub f: CursorFieldFn,
    pub required: Vec<String>,
}

impl CursorAttribute {
    pub fn new<F>(field_name: impl Into<String>, required: Vec<String>, f: F) -> Self
    where
        F: Fn(&dyn Cursor) -> CoreResult<Value> + Send + Sync + 'static,
    {
        CursorAttribute {
            field_name: field_name.into(),
            f: Arc::new(f),
            required,
        }
    }
}

/// How the interpreter obtains the value of a field.
#[derive(Clone)]
pub enum FieldResolution {
    /// Navigate the parent cursor.
    Cursor,
    Computed(CursorFieldFn),
    Delegated(Delegate),
}

/// The object safe view of a mapping which the compiler and interpreter work
/// against. Mappings of different backends compose through it.
#[async_trait]
pub trait Mapping: Send + Sync {
    fn schema(&self) -> &SchemaRef;

    fn resolve_field(&self, path: &[String], type_name: &str, field_name: &str) -> FieldResolution;

    fn select_elaborator(&self, type_name: &str, field_name: &str) -> Option<SelectElaborator>;

    fn encode_leaf(&self, type_name: &str, value: &Value) -> CoreResult<serde_json::Value>;

    /// Runs a root select. `type_name` is the type declaring the field: the
    /// query type, or the parent type of a delegated field.
    async fn run_root(&self, type_name: &str, select: &Select) -> CoreResult<(Query, CursorRef)>;

    fn validate(&self) -> Vec<ValidationFinding>;

    /// The declared type of a root field, falling back to the query type for
    /// fields delegated from other types.
    fn root_field_type(&self, type_name: &str, field_name: &str) -> Option<TypeRef> {
        let schema = self.schema();

        schema
            .field(type_name, field_name)
            .or_else(|| schema.field(schema.query_type(), field_name))
            .map(|f| f.tpe.clone())
    }
}
