use crate::ast::{Column, Compare, ConditionTree, ParameterizedValue};

/// Anything that can be selected, compared or ordered by.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Column(Box<Column>),
    /// A value rendered as a placeholder and bound as a parameter.
    Parameterized(ParameterizedValue),
    /// `LOWER(expr)`
    Lower(Box<Expression>),
    Compare(Compare),
    ConditionTree(ConditionTree),
}

/// Lowercases the expression in the database.
pub fn lower<E>(expr: E) -> Expression
where
    E: Into<Expression>,
{
    Expression::Lower(Box::new(expr.into()))
}

impl From<ParameterizedValue> for Expression {
    fn from(value: ParameterizedValue) -> Self {
        Expression::Parameterized(value)
    }
}
