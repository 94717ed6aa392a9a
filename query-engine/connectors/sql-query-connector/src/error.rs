use query_core::CoreError;
use thiserror::Error;

pub type SqlResult<T> = Result<T, SqlError>;

#[derive(Debug, Error)]
pub enum SqlError {
    #[error("Error opening the database at '{path}': {cause}")]
    ConnectionError {
        path: String,
        #[source]
        cause: rusqlite::Error,
    },

    #[error("Error querying the database: {0}")]
    QueryError(#[from] rusqlite::Error),

    #[error("Conversion failed: {0}")]
    ConversionError(String),

    #[error("Cannot translate predicate '{0}' into SQL")]
    UnsupportedPredicate(String),

    #[error("Cannot translate query '{0}' into SQL")]
    UnsupportedQuery(String),

    #[error("No key columns mapped for type '{0}'")]
    MissingKey(String),

    #[error("Column '{column}' of field '{field}' is not in table '{table}'")]
    ForeignColumn { field: String, column: String, table: String },

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl From<SqlError> for CoreError {
    fn from(err: SqlError) -> Self {
        match err {
            SqlError::Core(err) => err,
            other => CoreError::ConnectorError(other.to_string()),
        }
    }
}
