use thiserror::Error;

pub type SchemaResult<T> = std::result::Result<T, SchemaError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Failed to parse schema: {0}")]
    Parse(String),

    #[error("Type '{0}' is declared more than once")]
    DuplicateType(String),

    #[error("Type '{referenced}' referenced by '{owner}' is not declared")]
    UnknownType { owner: String, referenced: String },

    #[error("The query root type '{0}' is not declared")]
    MissingQueryType(String),
}
