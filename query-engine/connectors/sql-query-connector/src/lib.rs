//! A SQLite backed mapping for the query engine.
//!
//! Root fields compile into one statement each. The rows are read back through
//! [`SqlCursor`], which rebuilds nested entities from them.

#![deny(rust_2018_idioms, unsafe_code)]

pub mod ast;
mod cursor;
pub mod database;
mod error;
mod mapping;
mod plan;
mod stats;
pub mod visitor;

pub use cursor::SqlCursor;
pub use database::{Queryable, ResultSet, Sqlite};
pub use error::{SqlError, SqlResult};
pub use mapping::*;
pub use stats::*;
