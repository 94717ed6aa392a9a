use crate::ast::{ConditionTree, Expression};

/// A comparison, rendered as a boolean SQL expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Compare {
    /// `left = right`
    Equals(Box<Expression>, Box<Expression>),
    /// `left <> right`
    NotEquals(Box<Expression>, Box<Expression>),
    /// `left < right`
    LessThan(Box<Expression>, Box<Expression>),
    /// `left <= right`
    LessThanOrEquals(Box<Expression>, Box<Expression>),
    /// `left > right`
    GreaterThan(Box<Expression>, Box<Expression>),
    /// `left >= right`
    GreaterThanOrEquals(Box<Expression>, Box<Expression>),
    /// `left IN (..)`
    In(Box<Expression>, Vec<Expression>),
    /// `left LIKE right`
    Like(Box<Expression>, Box<Expression>),
    /// `expr IS NULL`
    Null(Box<Expression>),
    /// `expr IS NOT NULL`
    NotNull(Box<Expression>),
}

impl From<Compare> for ConditionTree {
    fn from(cmp: Compare) -> Self {
        ConditionTree::single(Expression::Compare(cmp))
    }
}

impl From<Compare> for Expression {
    fn from(cmp: Compare) -> Self {
        Expression::Compare(cmp)
    }
}

/// Builds comparisons from anything that converts into an expression.
pub trait Comparable: Sized {
    fn equals<T: Into<Expression>>(self, comparison: T) -> Compare;

    fn not_equals<T: Into<Expression>>(self, comparison: T) -> Compare;

    fn less_than<T: Into<Expression>>(self, comparison: T) -> Compare;

    fn less_than_or_equals<T: Into<Expression>>(self, comparison: T) -> Compare;

    fn greater_than<T: Into<Expression>>(self, comparison: T) -> Compare;

    fn greater_than_or_equals<T: Into<Expression>>(self, comparison: T) -> Compare;

    fn in_selection<T: Into<Expression>>(self, selection: Vec<T>) -> Compare;

    fn like<T: Into<Expression>>(self, pattern: T) -> Compare;

    fn is_null(self) -> Compare;

    fn is_not_null(self) -> Compare;
}

impl<U> Comparable for U
where
    U: Into<Expression>,
{
    fn equals<T: Into<Expression>>(self, comparison: T) -> Compare {
        Compare::Equals(Box::new(self.into()), Box::new(comparison.into()))
    }

    fn not_equals<T: Into<Expression>>(self, comparison: T) -> Compare {
        Compare::NotEquals(Box::new(self.into()), Box::new(comparison.into()))
    }

    fn less_than<T: Into<Expression>>(self, comparison: T) -> Compare {
        Compare::LessThan(Box::new(self.into()), Box::new(comparison.into()))
    }

    fn less_than_or_equals<T: Into<Expression>>(self, comparison: T) -> Compare {
        Compare::LessThanOrEquals(Box::new(self.into()), Box::new(comparison.into()))
    }

    fn greater_than<T: Into<Expression>>(self, comparison: T) -> Compare {
        Compare::GreaterThan(Box::new(self.into()), Box::new(comparison.into()))
    }

    fn greater_than_or_equals<T: Into<Expression>>(self, comparison: T) -> Compare {
        Compare::GreaterThanOrEquals(Box::new(self.into()), Box::new(comparison.into()))
    }

    fn in_selection<T: Into<Expression>>(self, selection: Vec<T>) -> Compare {
        Compare::In(Box::new(self.into()), selection.into_iter().map(Into::into).collect())
    }

    fn like<T: Into<Expression>>(self, pattern: T) -> Compare {
        Compare::Like(Box::new(self.into()), Box::new(pattern.into()))
    }

    fn is_null(self) -> Compare {
        Compare::Null(Box::new(self.into()))
    }

    fn is_not_null(self) -> Compare {
        Compare::NotNull(Box::new(self.into()))
    }
}
