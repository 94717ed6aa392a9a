use crate::{
    ast::ParameterizedValue, database::ResultSet, plan::{SqlPlan, TableNode}, SqlField, SqlMapping, DISCRIMINATOR,
};
use query_core::{cursor::mismatch, BackendField, CoreError, CoreResult, Cursor, CursorRef, FieldMapping, RootQuery};
use query_value::Value;
use schema::{NamedType, SchemaRef, TypeRef};
use std::{collections::HashMap, fmt, sync::Arc};

/// A position in the rows of one statement.
///
/// Object and list positions cover the rows of their entities; list
/// positions group them into elements by the key columns of the entity's
/// table, in the order the keys are first seen. Rows whose keys are null
/// belong to no element, which is how unmatched `LEFT JOIN`s disappear.
#[derive(Clone)]
pub struct SqlCursor {
    mapping: SqlMapping,
    nodes: Arc<Vec<TableNode>>,
    result: Arc<ResultSet>,
    path: Vec<String>,
    tpe: TypeRef,
    focus: Focus,
}

#[derive(Debug, Clone)]
enum Focus {
    Rows { node: usize, rows: Arc<[usize]> },
    Leaf(Value),
}

/// One non-null key column of a row. Reals compare by their bits so keys
/// can be hashed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum KeyPart<'a> {
    Integer(i64),
    Real(u64),
    Text(&'a str),
    Boolean(bool),
}

impl<'a> KeyPart<'a> {
    fn new(value: &'a ParameterizedValue) -> Option<Self> {
        match value {
            ParameterizedValue::Null => None,
            ParameterizedValue::Integer(i) => Some(KeyPart::Integer(*i)),
            ParameterizedValue::Real(f) => Some(KeyPart::Real(f.to_bits())),
            ParameterizedValue::Text(s) => Some(KeyPart::Text(s)),
            ParameterizedValue::Boolean(b) => Some(KeyPart::Boolean(*b)),
        }
    }
}

impl fmt::Debug for SqlCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlCursor")
            .field("path", &self.path)
            .field("tpe", &self.tpe)
            .field("focus", &self.focus)
            .finish()
    }
}

impl SqlCursor {
    pub(crate) fn root(mapping: SqlMapping, plan: &SqlPlan, query: RootQuery<'_>, result: Arc<ResultSet>) -> Self {
        let rows: Arc<[usize]> = (0..result.len()).collect();

        SqlCursor {
            mapping,
            nodes: Arc::clone(&plan.nodes),
            result,
            path: vec![query.field_name.to_owned()],
            tpe: query.tpe.clone(),
            focus: Focus::Rows { node: 0, rows },
        }
    }

    fn schema(&self) -> &SchemaRef {
        self.mapping.schema()
    }

    fn with(&self, tpe: TypeRef, focus: Focus) -> SqlCursor {
        SqlCursor {
            mapping: self.mapping.clone(),
            nodes: Arc::clone(&self.nodes),
            result: Arc::clone(&self.result),
            path: self.path.clone(),
            tpe,
            focus,
        }
    }

    fn rows(&self) -> CoreResult<(&TableNode, &[usize])> {
        match &self.focus {
            Focus::Rows { node, rows } => Ok((&self.nodes[*node], &rows[..])),
            Focus::Leaf(_) => Err(mismatch(self, "an object")),
        }
    }

    /// The key of the entity a row belongs to, `None` for rows without one.
    fn key(&self, node: &TableNode, row: usize) -> Option<Vec<KeyPart<'_>>> {
        node.keys
            .iter()
            .map(|column| self.result.value(row, *column).and_then(KeyPart::new))
            .collect()
    }

    /// Splits rows into entities in first-seen order.
    fn group(&self, node: &TableNode, rows: &[usize]) -> Vec<Vec<usize>> {
        let mut groups: Vec<Vec<usize>> = Vec::new();
        let mut index: HashMap<Vec<KeyPart<'_>>, usize> = HashMap::new();

        for row in rows {
            let Some(key) = self.key(node, *row) else {
                continue;
            };

            let position = *index.entry(key).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });

            groups[position].push(*row);
        }

        groups
    }

    /// The value of a selected column in the first row of this position.
    fn column_value(&self, column: &str) -> CoreResult<Value> {
        let (node, rows) = self.rows()?;

        let position = node
            .columns
            .get(column)
            .ok_or_else(|| CoreError::interpreter(format!("Column '{}.{column}' was not selected", node.table)))?;

        Ok(rows
            .first()
            .and_then(|row| self.result.value(*row, *position))
            .map(ParameterizedValue::to_value)
            .unwrap_or(Value::Null))
    }

    fn mapped_field(&self, field_name: &str) -> CoreResult<(String, SqlField)> {
        let tpe = self.concrete_type_name()?;

        match self.mapping.backend_field(&self.path, &tpe, field_name) {
            Some(field) if !field.hidden() => Ok((tpe, field.clone())),
            _ => Err(CoreError::MissingFieldMapping {
                field: field_name.to_owned(),
                tpe,
            }),
        }
    }
}

impl Cursor for SqlCursor {
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

        let Some(FieldMapping::Backend(SqlField::Discriminator { column, cases })) =
            self.mapping.field_mapping(&self.path, declared, DISCRIMINATOR)
        else {
            return Err(CoreError::interpreter(format!(
                "No discriminator for abstract type '{declared}'"
            )));
        };

        let value = self.column_value(&column.column)?;

        cases
            .iter()
            .find(|(case, _)| case.loosely_equals(&value))
            .map(|(_, tpe)| tpe.clone())
            .ok_or_else(|| {
                CoreError::interpreter(format!(
                    "Discriminator value {value} of '{declared}' at '{}' matches no type",
                    self.path.join(".")
                ))
            })
    }

    fn is_leaf(&self) -> bool {
        matches!(&self.tpe, TypeRef::Named(name) if self.schema().is_leaf(name))
    }

    fn as_leaf(&self) -> CoreResult<Value> {
        let Focus::Leaf(value) = &self.focus else {
            return Err(mismatch(self, "a leaf"));
        };

        if !self.is_leaf() {
            return Err(mismatch(self, "a leaf"));
        }

        let name = self.tpe.underlying_name();

        Ok(match (value.clone(), self.schema().find_type(name)) {
            (Value::String(s), Some(NamedType::Enum(_))) => Value::Enum(s),
            (Value::String(s), _) if name == "ID" => Value::Id(s),
            (Value::Int(i), _) if name == "ID" => Value::Id(i.to_string()),
            (Value::Int(i), _) if name == "Float" => Value::Float(i as f64),
            (Value::Int(i), _) if name == "Boolean" => Value::Boolean(i != 0),
            (value, _) => value,
        })
    }

    fn as_list(&self) -> CoreResult<Vec<CursorRef>> {
        let item = self.tpe.item().unwrap_or_else(|| self.tpe.non_null()).clone();

        match &self.focus {
            Focus::Rows { node, rows } => {
                let groups = self.group(&self.nodes[*node], rows);

                Ok(groups
                    .into_iter()
                    .map(|rows| {
                        let focus = Focus::Rows {
                            node: *node,
                            rows: rows.into(),
                        };

                        Arc::new(self.with(item.clone(), focus)) as CursorRef
                    })
                    .collect())
            }
            Focus::Leaf(Value::List(values)) => Ok(values
                .iter()
                .map(|v| Arc::new(self.with(item.clone(), Focus::Leaf(v.clone()))) as CursorRef)
                .collect()),
            Focus::Leaf(value) if value.is_empty() => Ok(Vec::new()),
            Focus::Leaf(_) => Ok(vec![Arc::new(self.with(item, self.focus.clone())) as CursorRef]),
        }
    }

    fn as_nullable(&self) -> CoreResult<Option<CursorRef>> {
        let TypeRef::Nullable(inner) = &self.tpe else {
            return Err(mismatch(self, "a nullable value"));
        };

        let inner = inner.as_ref().clone();

        match &self.focus {
            Focus::Leaf(value) if value.is_empty() => Ok(None),
            Focus::Leaf(_) => Ok(Some(Arc::new(self.with(inner, self.focus.clone())) as CursorRef)),
            Focus::Rows { node, rows } => {
                let table = &self.nodes[*node];
                let present: Arc<[usize]> = rows.iter().copied().filter(|row| self.key(table, *row).is_some()).collect();

                if present.is_empty() {
                    return Ok(None);
                }

                let focus = Focus::Rows {
                    node: *node,
                    rows: present,
                };

                Ok(Some(Arc::new(self.with(inner, focus)) as CursorRef))
            }
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

        Ok(Arc::new(self.with(TypeRef::named(type_name), self.focus.clone())))
    }

    fn has_field(&self, field_name: &str) -> bool {
        let Ok((node, _)) = self.rows() else {
            return false;
        };

        match self.mapped_field(field_name) {
            Ok((_, SqlField::Column { column, .. })) => node.columns.contains_key(&column.column),
            Ok((_, SqlField::Object { .. })) => node.children.contains_key(field_name),
            _ => false,
        }
    }

    fn field(&self, field_name: &str) -> CoreResult<CursorRef> {
        let (tpe, field) = self.mapped_field(field_name)?;

        let field_tpe = self
            .schema()
            .field(&tpe, field_name)
            .map(|f| f.tpe.clone())
            .ok_or_else(|| CoreError::UnknownField {
                field: field_name.to_owned(),
                tpe: tpe.clone(),
            })?;

        let focus = match &field {
            SqlField::Column { column, .. } => Focus::Leaf(self.column_value(&column.column)?),
            SqlField::Object { .. } => {
                let (node, rows) = self.rows()?;

                let child = node.children.get(field_name).copied().ok_or_else(|| {
                    CoreError::interpreter(format!("Field '{field_name}' of type '{tpe}' was not joined"))
                })?;

                Focus::Rows {
                    node: child,
                    rows: rows.into(),
                }
            }
            SqlField::Discriminator { .. } => {
                return Err(CoreError::MissingFieldMapping {
                    field: field_name.to_owned(),
                    tpe,
                });
            }
        };

        let mut cursor = self.with(field_tpe, focus);
        cursor.path.push(field_name.to_owned());

        Ok(Arc::new(cursor))
    }

    fn has_attribute(&self, attribute: &str) -> bool {
        self.attribute(attribute).is_ok()
    }

    fn attribute(&self, attribute: &str) -> CoreResult<Value> {
        let tpe = self.concrete_type_name()?;

        self.mapping.attribute(self, &tpe, attribute, |field| match field.as_column() {
            Some(column) => self.column_value(&column.column),
            None => Err(CoreError::MissingAttribute {
                attribute: attribute.to_owned(),
                tpe: tpe.clone(),
            }),
        })
    }
}
