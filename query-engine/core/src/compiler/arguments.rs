//! Binding of select arguments against field signatures.

use crate::{CoreError, CoreResult};
use itertools::Itertools;
use query_structure::Binding;
use query_value::Value;
use schema::{Field, InputObjectType, InputValue, NamedType, Schema, TypeRef};

/// The field an argument value is checked for, used in messages.
struct ArgumentContext<'a> {
    schema: &'a Schema,
    type_name: &'a str,
    field_name: &'a str,
}

/// Checks the bindings of a select against the arguments of `field`.
///
/// The result has one binding per declared argument, in declaration order.
/// Missing arguments receive their default verbatim, or `Absent` when they
/// are nullable without a default.
pub(crate) fn elaborate_bindings(
    schema: &Schema,
    type_name: &str,
    field: &Field,
    bindings: Vec<Binding>,
) -> CoreResult<Vec<Binding>> {
    let ctx = ArgumentContext {
        schema,
        type_name,
        field_name: &field.name,
    };

    let unknown = bindings
        .iter()
        .filter(|b| field.arg(&b.name).is_none())
        .map(|b| format!("'{}'", b.name))
        .collect::<Vec<_>>();

    if !unknown.is_empty() {
        return Err(CoreError::elaboration(format!(
            "Unknown argument(s) {} in field '{}' of type '{}'",
            unknown.join(", "),
            field.name,
            type_name
        )));
    }

    let mut bindings = bindings;

    field
        .args
        .iter()
        .map(|arg| {
            let supplied = bindings
                .iter()
                .position(|b| b.name == arg.name)
                .map(|idx| bindings.swap_remove(idx).value);

            let value = match supplied {
                Some(value) if !value.is_absent() => ctx.coerce(value, &arg.tpe)?,
                _ => ctx.default_for(arg, "argument", None)?,
            };

            Ok(Binding::new(arg.name.clone(), value))
        })
        .collect()
}

impl ArgumentContext<'_> {
    fn location(&self) -> String {
        format!("in field '{}' of type '{}'", self.field_name, self.type_name)
    }

    fn default_for(&self, input: &InputValue, what: &str, input_type: Option<&str>) -> CoreResult<Value> {
        match &input.default_value {
            Some(default) => Ok(default.clone()),
            None if input.tpe.is_nullable() => Ok(Value::Absent),
            None => {
                let owner = input_type
                    .map(|t| format!(" of input object type {t}"))
                    .unwrap_or_default();

                Err(CoreError::elaboration(format!(
                    "Missing required {what} '{}'{owner} {}",
                    input.name,
                    self.location()
                )))
            }
        }
    }

    fn coerce(&self, value: Value, tpe: &TypeRef) -> CoreResult<Value> {
        match value {
            Value::Null if tpe.is_nullable() => return Ok(Value::Null),
            Value::Null => {
                return Err(CoreError::elaboration(format!(
                    "Null value for non-nullable input of type {tpe} {}",
                    self.location()
                )));
            }
            Value::Absent => return Ok(Value::Absent),
            _ => (),
        }

        match tpe.non_null() {
            TypeRef::List(item) => match value {
                Value::List(values) => Ok(Value::List(
                    values.into_iter().map(|v| self.coerce(v, item)).collect::<CoreResult<_>>()?,
                )),
                single => Ok(Value::List(vec![self.coerce(single, item)?])),
            },
            TypeRef::Named(name) => match self.schema.find_type(name) {
                Some(NamedType::Scalar(scalar)) => self.coerce_scalar(scalar, value),
                Some(NamedType::Enum(e)) => match value {
                    Value::Enum(v) | Value::String(v) if e.values.contains(&v) => Ok(Value::Enum(v)),
                    other => Err(CoreError::elaboration(format!(
                        "Invalid value {other} for enum type {} {}",
                        e.name,
                        self.location()
                    ))),
                },
                Some(NamedType::InputObject(io)) => self.coerce_input_object(io, value),
                _ => Err(CoreError::elaboration(format!(
                    "Type {name} cannot be used as an input {}",
                    self.location()
                ))),
            },
            TypeRef::Nullable(inner) => self.coerce(value, inner),
        }
    }

    fn coerce_scalar(&self, scalar: &str, value: Value) -> CoreResult<Value> {
        match (scalar, value) {
            ("Int", v @ Value::Int(_)) => Ok(v),
            ("Float", Value::Int(i)) => Ok(Value::Float(i as f64)),
            ("Float", v @ Value::Float(_)) => Ok(v),
            ("String", v @ Value::String(_)) => Ok(v),
            ("Boolean", v @ Value::Boolean(_)) => Ok(v),
            ("ID", Value::String(s) | Value::Id(s)) => Ok(Value::Id(s)),
            ("ID", Value::Int(i)) => Ok(Value::Id(i.to_string())),
            ("Int" | "Float" | "String" | "Boolean" | "ID", other) => Err(CoreError::elaboration(format!(
                "Expected {scalar} found {} {}",
                other.kind(),
                self.location()
            ))),
            // Custom scalars accept any literal.
            (_, v) => Ok(v),
        }
    }

    fn coerce_input_object(&self, io: &InputObjectType, value: Value) -> CoreResult<Value> {
        let Value::Object(mut pairs) = value else {
            return Err(CoreError::elaboration(format!(
                "Expected input object value of type {} {}",
                io.name,
                self.location()
            )));
        };

        let unknown = pairs
            .iter()
            .filter(|(name, _)| io.field(name).is_none())
            .map(|(name, _)| format!("'{name}'"))
            .join(", ");

        if !unknown.is_empty() {
            return Err(CoreError::elaboration(format!(
                "Unknown field(s) {unknown} in input object value of type {} {}",
                io.name,
                self.location()
            )));
        }

        let fields = io
            .fields
            .iter()
            .map(|input| {
                let supplied = pairs
                    .iter()
                    .position(|(name, _)| name == &input.name)
                    .map(|idx| pairs.swap_remove(idx).1);

                let value = match supplied {
                    Some(value) if !value.is_absent() => self.coerce(value, &input.tpe)?,
                    _ => self.default_for(input, "field", Some(&io.name))?,
                };

                Ok((input.name.clone(), value))
            })
            .collect::<CoreResult<Vec<_>>>()?;

        Ok(Value::Object(fields))
    }
}
