use super::{Queryable, ResultSet};
use crate::{ast::ParameterizedValue, SqlError, SqlResult};
use async_trait::async_trait;
use rusqlite::{
    params_from_iter,
    types::{ToSqlOutput, Value as SqliteValue, ValueRef},
    Connection, ToSql,
};
use tokio::sync::Mutex;
use tracing::debug;

/// A connection to a SQLite database, in memory or in a file.
///
/// `LIKE` is made case sensitive on every connection, so case insensitive
/// matching has to go through `LOWER`.
pub struct Sqlite {
    client: Mutex<Connection>,
    file_path: Option<String>,
}

impl Sqlite {
    pub fn new(file_path: &str) -> SqlResult<Self> {
        let conn = Connection::open(file_path).map_err(|cause| SqlError::ConnectionError {
            path: file_path.to_owned(),
            cause,
        })?;

        Self::with_connection(conn, Some(file_path.to_owned()))
    }

    pub fn new_in_memory() -> SqlResult<Self> {
        let conn = Connection::open_in_memory().map_err(|cause| SqlError::ConnectionError {
            path: String::from(":memory:"),
            cause,
        })?;

        Self::with_connection(conn, None)
    }

    fn with_connection(conn: Connection, file_path: Option<String>) -> SqlResult<Self> {
        conn.execute_batch("PRAGMA case_sensitive_like = ON;")?;

        Ok(Sqlite {
            client: Mutex::new(conn),
            file_path,
        })
    }

    /// `None` for in-memory databases.
    pub fn file_path(&self) -> Option<&str> {
        self.file_path.as_deref()
    }
}

#[async_trait]
impl Queryable for Sqlite {
    async fn query_raw(&self, sql: &str, params: &[ParameterizedValue]) -> SqlResult<ResultSet> {
        debug!(query = sql, params = ?params, "sqlite query");

        let client = self.client.lock().await;
        let mut stmt = client.prepare_cached(sql)?;

        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();

        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        let mut values = Vec::new();

        while let Some(row) = rows.next()? {
            let mut row_values = Vec::with_capacity(width);

            for i in 0..width {
                row_values.push(from_sqlite(row.get_ref(i)?)?);
            }

            values.push(row_values);
        }

        Ok(ResultSet::new(columns, values))
    }

    async fn raw_cmd(&self, cmd: &str) -> SqlResult<()> {
        debug!(query = cmd, "sqlite command");

        let client = self.client.lock().await;
        client.execute_batch(cmd)?;

        Ok(())
    }
}

fn from_sqlite(value: ValueRef<'_>) -> SqlResult<ParameterizedValue> {
    Ok(match value {
        ValueRef::Null => ParameterizedValue::Null,
        ValueRef::Integer(i) => ParameterizedValue::Integer(i),
        ValueRef::Real(f) => ParameterizedValue::Real(f),
        ValueRef::Text(bytes) => ParameterizedValue::Text(
            String::from_utf8(bytes.to_vec()).map_err(|err| SqlError::ConversionError(err.to_string()))?,
        ),
        ValueRef::Blob(_) => return Err(SqlError::ConversionError(String::from("Blob values are not supported"))),
    })
}

impl ToSql for ParameterizedValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            ParameterizedValue::Null => ToSqlOutput::Owned(SqliteValue::Null),
            ParameterizedValue::Integer(i) => ToSqlOutput::Owned(SqliteValue::Integer(*i)),
            ParameterizedValue::Real(f) => ToSqlOutput::Owned(SqliteValue::Real(*f)),
            ParameterizedValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            ParameterizedValue::Boolean(b) => ToSqlOutput::Owned(SqliteValue::Integer(i64::from(*b))),
        })
    }
}
