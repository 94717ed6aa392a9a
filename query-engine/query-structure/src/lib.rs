//! The query algebra: the tree a client query is compiled into, and the
//! predicates and orderings it carries.

mod order_by;
mod predicate;
mod query;

pub use order_by::*;
pub use predicate::*;
pub use query::*;

pub use query_value::Value;
