use crate::ast::Expression;

/// An expression to sort the rows by, in ascending order.
pub type OrderDefinition = Expression;

/// The `ORDER BY` clause of a select.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Ordering(pub Vec<OrderDefinition>);

impl Ordering {
    pub fn append(mut self, value: OrderDefinition) -> Self {
        self.0.push(value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// An item that can be used in the `ORDER BY` clause.
pub trait Orderable: Into<Expression> {
    fn ascend(self) -> OrderDefinition {
        self.into()
    }
}

impl<T> Orderable for T where T: Into<Expression> {}
