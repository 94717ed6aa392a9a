use crate::ast::{ConditionTree, Table};

/// The table and conditions of a `LEFT JOIN`.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinData {
    pub table: Table,
    pub conditions: ConditionTree,
}

/// An item that can be joined.
pub trait Joinable {
    /// Specifies the conditions the join is done on.
    fn on<T>(self, conditions: T) -> JoinData
    where
        T: Into<ConditionTree>;
}
