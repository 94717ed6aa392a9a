//! An abstract syntax tree for the SQL statements the connector issues.
//!
//! The ast module only describes queries. Rendering them into SQL text for a
//! database is the job of the [visitor](../visitor/index.html) module.
mod column;
mod compare;
mod conditions;
mod expression;
mod join;
mod ordering;
mod select;
mod table;
mod values;

pub use column::Column;
pub use compare::{Comparable, Compare};
pub use conditions::ConditionTree;
pub use expression::{lower, Expression};
pub use join::{JoinData, Joinable};
pub use ordering::{OrderDefinition, Orderable, Ordering};
pub use select::Select;
pub use table::{Aliasable, Table};
pub use values::ParameterizedValue;
