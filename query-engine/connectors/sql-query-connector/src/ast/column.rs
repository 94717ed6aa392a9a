use crate::ast::{Expression, Table};

/// A column, optionally qualified by the table (or table alias) it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Column {
    pub name: String,
    pub table: Option<Table>,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Column {
            name: name.into(),
            table: None,
        }
    }

    pub fn table(mut self, table: impl Into<Table>) -> Self {
        self.table = Some(table.into());
        self
    }
}

impl From<&str> for Column {
    fn from(name: &str) -> Self {
        Column::new(name)
    }
}

impl From<String> for Column {
    fn from(name: String) -> Self {
        Column::new(name)
    }
}

/// `(table, column)`
impl<T: Into<Table>> From<(T, &str)> for Column {
    fn from((table, name): (T, &str)) -> Self {
        Column::new(name).table(table)
    }
}

impl From<Column> for Expression {
    fn from(column: Column) -> Self {
        Expression::Column(Box::new(column))
    }
}
