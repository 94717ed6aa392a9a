use crate::ast::Expression;

/// Tree structures and leaves for condition building.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ConditionTree {
    /// `(left AND right)`
    And(Box<Expression>, Box<Expression>),
    /// `(left OR right)`
    Or(Box<Expression>, Box<Expression>),
    /// `(NOT expr)`
    Not(Box<Expression>),
    /// A single expression leaf
    Single(Box<Expression>),
    /// A leaf that does nothing to the condition, `1=1`
    #[default]
    NoCondition,
    /// A leaf that cancels the condition, `1=0`
    NegativeCondition,
}

impl ConditionTree {
    pub fn and<E, J>(left: E, right: J) -> ConditionTree
    where
        E: Into<Expression>,
        J: Into<Expression>,
    {
        ConditionTree::And(Box::new(left.into()), Box::new(right.into()))
    }

    pub fn or<E, J>(left: E, right: J) -> ConditionTree
    where
        E: Into<Expression>,
        J: Into<Expression>,
    {
        ConditionTree::Or(Box::new(left.into()), Box::new(right.into()))
    }

    pub fn not<E>(expr: E) -> ConditionTree
    where
        E: Into<Expression>,
    {
        ConditionTree::Not(Box::new(expr.into()))
    }

    pub fn single<E>(expr: E) -> ConditionTree
    where
        E: Into<Expression>,
    {
        ConditionTree::Single(Box::new(expr.into()))
    }

    /// `AND`s the conditions, skipping trivial ones.
    pub fn conjoin<T>(self, other: T) -> ConditionTree
    where
        T: Into<ConditionTree>,
    {
        match (self, other.into()) {
            (ConditionTree::NoCondition, other) | (other, ConditionTree::NoCondition) => other,
            (left, right) => ConditionTree::and(left, right),
        }
    }

    /// `AND`s all conditions, `NoCondition` when there are none.
    pub fn all<I>(conditions: I) -> ConditionTree
    where
        I: IntoIterator<Item = ConditionTree>,
    {
        conditions.into_iter().fold(ConditionTree::NoCondition, ConditionTree::conjoin)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ConditionTree::NoCondition)
    }
}

impl From<ConditionTree> for Expression {
    fn from(ct: ConditionTree) -> Self {
        Expression::ConditionTree(ct)
    }
}

impl From<Expression> for ConditionTree {
    fn from(expr: Expression) -> Self {
        match expr {
            Expression::ConditionTree(ct) => ct,
            other => ConditionTree::Single(Box::new(other)),
        }
    }
}
