//! Connections to the database and the rows they return.
mod result_set;
mod sqlite;

pub use result_set::ResultSet;
pub use sqlite::Sqlite;

use crate::{ast::ParameterizedValue, SqlResult};
use async_trait::async_trait;

/// Represents a connection which can be queried.
#[async_trait]
pub trait Queryable: Send + Sync {
    /// Executes a rendered query with its parameters, returning the rows.
    async fn query_raw(&self, sql: &str, params: &[ParameterizedValue]) -> SqlResult<ResultSet>;

    /// Runs one or more statements which return nothing, e.g. schema setup.
    async fn raw_cmd(&self, cmd: &str) -> SqlResult<()>;
}
