//! Bound GraphQL input values.
//!
//! `Value` is the leaf representation of the query algebra: arguments attached to
//! selections, constants inside predicates and the primitive values yielded by
//! cursors all use it. `Absent` and `Null` are distinct: `Absent` means the
//! argument was not supplied at all, `Null` means it was explicitly supplied as
//! `null`.

mod error;

pub use error::ConversionFailure;

use serde::ser::{SerializeMap, SerializeSeq, Serializer};
use serde::Serialize;
use std::{cmp::Ordering, fmt};

pub type ValueResult<T> = std::result::Result<T, ConversionFailure>;
pub type ObjectValue = Vec<(String, Value)>;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Not supplied. Defaults apply.
    #[default]
    Absent,
    /// Explicitly supplied as `null`.
    Null,
    Int(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Id(String),
    Enum(String),
    List(Vec<Value>),
    /// Input object, field order as given.
    Object(ObjectValue),
    /// A `$name` reference which has not been substituted yet.
    Variable(String),
}

impl Value {
    pub fn object<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Value::Object(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn list<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::List(values.into_iter().map(Into::into).collect())
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True for values which carry no data: absent or null.
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Absent | Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Id(s) | Value::Enum(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&[(String, Value)]> {
        match self {
            Value::Object(pairs) => Some(pairs),
            _ => None,
        }
    }

    pub fn into_object(self) -> Option<ObjectValue> {
        match self {
            Value::Object(pairs) => Some(pairs),
            _ => None,
        }
    }

    /// Looks up a field of an input object value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.as_object()
            .and_then(|pairs| pairs.iter().find(|(k, _)| k == name).map(|(_, v)| v))
    }

    /// Converts an untyped JSON value. Numbers which fit an `i64` become `Int`,
    /// all other numbers become `Float`; strings stay strings since the JSON
    /// representation carries no enum or id information.
    pub fn from_json(json: &serde_json::Value) -> ValueResult<Value> {
        Ok(match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(*b),
            serde_json::Value::Number(num) => match num.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(
                    num.as_f64()
                        .ok_or_else(|| ConversionFailure::new("JSON number", "Value::Float"))?,
                ),
            },
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(values) => Value::List(
                values
                    .iter()
                    .map(Value::from_json)
                    .collect::<ValueResult<Vec<_>>>()?,
            ),
            serde_json::Value::Object(obj) => Value::Object(
                obj.iter()
                    .map(|(k, v)| Value::from_json(v).map(|v| (k.clone(), v)))
                    .collect::<ValueResult<Vec<_>>>()?,
            ),
        })
    }

    pub fn to_json(&self) -> ValueResult<serde_json::Value> {
        serde_json::to_value(self).map_err(|_| ConversionFailure::new(self.kind(), "JSON value"))
    }

    /// Orders scalar values of compatible kinds. Ints and floats compare
    /// numerically; `None` for incomparable kinds.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                self.as_float()?.partial_cmp(&other.as_float()?)
            }
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            (Value::String(a) | Value::Id(a) | Value::Enum(a), Value::String(b) | Value::Id(b) | Value::Enum(b)) => {
                Some(a.cmp(b))
            }
            (Value::Null, Value::Null) => Some(Ordering::Equal),
            _ => None,
        }
    }

    /// Equality used by predicates: numeric kinds compare by value and the
    /// string-like kinds compare by content.
    pub fn loosely_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(a, b)| a.loosely_equals(b))
            }
            _ => self.compare(other) == Some(Ordering::Equal) || self == other,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Value::Absent => "absent",
            Value::Null => "null",
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::String(_) => "String",
            Value::Boolean(_) => "Boolean",
            Value::Id(_) => "ID",
            Value::Enum(_) => "enum",
            Value::List(_) => "list",
            Value::Object(_) => "input object",
            Value::Variable(_) => "variable",
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Absent | Value::Null => serializer.serialize_none(),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) | Value::Id(s) | Value::Enum(s) => serializer.serialize_str(s),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Variable(name) => serializer.serialize_str(&format!("${name}")),
            Value::List(values) => {
                let mut seq = serializer.serialize_seq(Some(values.len()))?;

                for value in values {
                    seq.serialize_element(value)?;
                }

                seq.end()
            }
            Value::Object(pairs) => {
                let present = pairs.iter().filter(|(_, v)| !v.is_absent());
                let mut map = serializer.serialize_map(None)?;

                for (k, v) in present {
                    map.serialize_entry(k, v)?;
                }

                map.end()
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Absent => "<absent>".fmt(f),
            Value::Null => "null".fmt(f),
            Value::Int(i) => i.fmt(f),
            Value::Float(x) => x.fmt(f),
            Value::String(s) | Value::Id(s) => write!(f, "\"{s}\""),
            Value::Enum(e) => e.fmt(f),
            Value::Boolean(b) => b.fmt(f),
            Value::Variable(name) => write!(f, "${name}"),
            Value::List(values) => {
                let joined = values.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ");
                write!(f, "[{joined}]")
            }
            Value::Object(pairs) => {
                let joined = pairs
                    .iter()
                    .filter(|(_, v)| !v.is_absent())
                    .map(|(k, v)| format!("{k}: {v}"))
                    .collect::<Vec<_>>()
                    .join(", ");

                write!(f, "{{{joined}}}")
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Null)
    }
}

impl TryFrom<Value> for i64 {
    type Error = ConversionFailure;

    fn try_from(value: Value) -> ValueResult<i64> {
        value.as_int().ok_or_else(|| ConversionFailure::new(value.kind(), "i64"))
    }
}

impl TryFrom<Value> for String {
    type Error = ConversionFailure;

    fn try_from(value: Value) -> ValueResult<String> {
        match value {
            Value::String(s) | Value::Id(s) | Value::Enum(s) => Ok(s),
            other => Err(ConversionFailure::new(other.kind(), "String")),
        }
    }
}

impl TryFrom<Value> for bool {
    type Error = ConversionFailure;

    fn try_from(value: Value) -> ValueResult<bool> {
        value.as_boolean().ok_or_else(|| ConversionFailure::new(value.kind(), "bool"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn absent_fields_are_not_serialized() {
        let value = Value::object([("a", Value::Int(1)), ("b", Value::Absent), ("c", Value::Null)]);

        assert_eq!(value.to_json().unwrap(), json!({ "a": 1, "c": null }));
    }

    #[test]
    fn json_numbers_keep_their_kind() {
        let value = Value::from_json(&json!([1, 2.5, "x", null])).unwrap();

        assert_eq!(
            value,
            Value::List(vec![
                Value::Int(1),
                Value::Float(2.5),
                Value::String("x".into()),
                Value::Null
            ])
        );
    }

    #[test]
    fn numeric_comparison_crosses_int_and_float() {
        assert_eq!(Value::Int(2).compare(&Value::Float(2.5)), Some(Ordering::Less));
        assert!(Value::Int(3).loosely_equals(&Value::Float(3.0)));
        assert_eq!(Value::Int(1).compare(&Value::from("1")), None);
    }

    #[test]
    fn null_and_absent_are_distinct() {
        assert_ne!(Value::Null, Value::Absent);
        assert!(Value::Null.is_empty() && Value::Absent.is_empty());
    }
}
