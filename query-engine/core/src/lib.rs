#![deny(rust_2018_idioms, unsafe_code)]

pub mod compiler;
pub mod cursor;
pub mod engine;
pub mod error;
pub mod interpreter;
pub mod introspection;
pub mod mapping;
pub mod response;
pub mod value_mapping;

pub use compiler::{CompilerContext, Phase, QueryCompiler};
pub use cursor::*;
pub use engine::*;
pub use error::*;
pub use interpreter::QueryInterpreter;
pub use mapping::*;
pub use response::*;
pub use value_mapping::*;

pub use query_structure::{self, Query};
pub use query_value::Value;
pub use schema::{self, Schema, SchemaRef};
