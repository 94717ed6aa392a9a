use crate::ast::*;

/// A builder for a `SELECT` statement.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct Select {
    pub table: Option<Table>,
    pub columns: Vec<Expression>,
    pub conditions: Option<ConditionTree>,
    pub ordering: Ordering,
    pub joins: Vec<JoinData>,
}

impl Select {
    pub fn from<T>(table: T) -> Self
    where
        T: Into<Table>,
    {
        Select {
            table: Some(table.into()),
            ..Default::default()
        }
    }

    pub fn column<T>(mut self, column: T) -> Self
    where
        T: Into<Column>,
    {
        self.columns.push(column.into().into());
        self
    }

    /// Adds conditions to the `WHERE` clause.
    pub fn and_where<T>(mut self, conditions: T) -> Self
    where
        T: Into<ConditionTree>,
    {
        let existing = self.conditions.take().unwrap_or_default();
        let conditions = existing.conjoin(conditions);

        self.conditions = (!conditions.is_empty()).then_some(conditions);
        self
    }

    pub fn left_join<J>(mut self, join: J) -> Self
    where
        J: Into<JoinData>,
    {
        self.joins.push(join.into());
        self
    }

    pub fn order_by(mut self, value: OrderDefinition) -> Self {
        self.ordering = self.ordering.append(value);
        self
    }
}
