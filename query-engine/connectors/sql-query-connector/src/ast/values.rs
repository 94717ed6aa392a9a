use crate::{SqlError, SqlResult};
use query_value::Value;
use std::fmt;

/// A value bound to a statement parameter, or read back from a row.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterizedValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Boolean(bool),
}

impl ParameterizedValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ParameterizedValue::Null)
    }

    /// Converts an argument of the query algebra. Only scalars can be bound.
    pub fn try_from_value(value: &Value) -> SqlResult<Self> {
        Ok(match value {
            Value::Absent | Value::Null => ParameterizedValue::Null,
            Value::Int(i) => ParameterizedValue::Integer(*i),
            Value::Float(f) => ParameterizedValue::Real(*f),
            Value::Boolean(b) => ParameterizedValue::Boolean(*b),
            Value::String(s) | Value::Id(s) | Value::Enum(s) => ParameterizedValue::Text(s.clone()),
            other => {
                return Err(SqlError::ConversionError(format!(
                    "Cannot bind a {} value as a statement parameter",
                    other.kind()
                )));
            }
        })
    }

    /// The value as the query algebra sees it, before any schema typing.
    pub fn to_value(&self) -> Value {
        match self {
            ParameterizedValue::Null => Value::Null,
            ParameterizedValue::Integer(i) => Value::Int(*i),
            ParameterizedValue::Real(f) => Value::Float(*f),
            ParameterizedValue::Text(s) => Value::String(s.clone()),
            ParameterizedValue::Boolean(b) => Value::Boolean(*b),
        }
    }
}

impl fmt::Display for ParameterizedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterizedValue::Null => f.write_str("null"),
            ParameterizedValue::Integer(i) => write!(f, "{i}"),
            ParameterizedValue::Real(r) => write!(f, "{r}"),
            ParameterizedValue::Text(s) => write!(f, "\"{s}\""),
            ParameterizedValue::Boolean(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for ParameterizedValue {
    fn from(s: &str) -> Self {
        ParameterizedValue::Text(s.to_owned())
    }
}

impl From<String> for ParameterizedValue {
    fn from(s: String) -> Self {
        ParameterizedValue::Text(s)
    }
}

impl From<i64> for ParameterizedValue {
    fn from(i: i64) -> Self {
        ParameterizedValue::Integer(i)
    }
}

impl From<f64> for ParameterizedValue {
    fn from(f: f64) -> Self {
        ParameterizedValue::Real(f)
    }
}

impl From<bool> for ParameterizedValue {
    fn from(b: bool) -> Self {
        ParameterizedValue::Boolean(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_kinds_are_bindable() {
        assert_eq!(
            ParameterizedValue::try_from_value(&Value::Id("42".into())).unwrap(),
            ParameterizedValue::from("42")
        );
        assert_eq!(
            ParameterizedValue::try_from_value(&Value::Absent).unwrap(),
            ParameterizedValue::Null
        );
        assert!(ParameterizedValue::try_from_value(&Value::list([1])).is_err());
    }
}
