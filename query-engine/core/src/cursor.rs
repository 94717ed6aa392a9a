use crate::{CoreError, CoreResult};
use query_value::Value;
use schema::TypeRef;
use std::{fmt, sync::Arc};

pub type CursorRef = Arc<dyn Cursor>;

/// A position in a result, independent of the backend producing it.
///
/// The type of a cursor is the schema type of the position: a nullable cursor
/// must be unwrapped with `as_nullable` and a list cursor with `as_list` before
/// fields or leaf values can be read. A cursor never mutates the data it wraps.
pub trait Cursor: Send + Sync + fmt::Debug {
    /// Field names from the root of the mapping to this position.
    fn path(&self) -> &[String];

    fn tpe(&self) -> &TypeRef;

    /// The runtime object type at this position. Only differs from the
    /// declared type for interfaces and unions.
    fn concrete_type_name(&self) -> CoreResult<String> {
        Ok(self.tpe().underlying_name().to_owned())
    }

    fn is_leaf(&self) -> bool;

    fn as_leaf(&self) -> CoreResult<Value>;

    fn is_list(&self) -> bool {
        self.tpe().is_list()
    }

    /// The elements at this position. Backends may also expose a singular
    /// position as a sequence, which `Unique` relies on.
    fn as_list(&self) -> CoreResult<Vec<CursorRef>>;

    fn is_nullable(&self) -> bool {
        self.tpe().is_nullable()
    }

    fn as_nullable(&self) -> CoreResult<Option<CursorRef>>;

    fn narrows_to(&self, type_name: &str) -> bool;

    fn narrow(&self, type_name: &str) -> CoreResult<CursorRef>;

    fn has_field(&self, field_name: &str) -> bool;

    fn field(&self, field_name: &str) -> CoreResult<CursorRef>;

    fn has_attribute(&self, attribute: &str) -> bool;

    fn attribute(&self, attribute: &str) -> CoreResult<Value>;
}

/// Error for a cursor asked for a shape it doesn't have.
pub fn mismatch(cursor: &dyn Cursor, expected: &str) -> CoreError {
    CoreError::interpreter(format!(
        "Expected {expected} at '{}', found type {}",
        cursor.path().join("."),
        cursor.tpe()
    ))
}
