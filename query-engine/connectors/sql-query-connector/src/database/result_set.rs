use crate::ast::ParameterizedValue;
use std::sync::Arc;

/// The rows of a query, with the names of the columns they contain.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultSet {
    columns: Arc<Vec<String>>,
    rows: Vec<Vec<ParameterizedValue>>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<ParameterizedValue>>) -> Self {
        ResultSet {
            columns: Arc::new(columns),
            rows,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The value of the row at `row` in the column at `column`.
    pub fn value(&self, row: usize, column: usize) -> Option<&ParameterizedValue> {
        self.rows.get(row).and_then(|r| r.get(column))
    }
}
