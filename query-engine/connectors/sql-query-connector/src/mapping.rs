//! Field mappings onto tables and columns, and the builder of SQL backed
//! mappings.

use crate::{
    database::Queryable,
    plan::SqlPlan,
    stats::{SqlMonitor, SqlStats, TracingMonitor},
    visitor::{self, Visitor},
    SqlCursor,
};
use async_trait::async_trait;
use query_core::{
    BackendField, CoreResult, CursorRef, FieldMapping, MappingBuilder, MappingRegistry, RootCursor, RootMapping,
    RootQuery, SchemaRef,
};
use query_structure::{Query, Select};
use query_value::Value;
use std::{fmt, sync::Arc};
use tracing::debug;

pub type SqlMapping = MappingRegistry<SqlField>;

/// The name the discriminator of an abstract type is registered under.
pub const DISCRIMINATOR: &str = "__discriminator";

/// A column of a table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    pub table: String,
    pub column: String,
}

impl ColumnRef {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        ColumnRef {
            table: table.into(),
            column: column.into(),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

/// One hop from a parent table to a child table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlJoin {
    pub parent: ColumnRef,
    pub child: ColumnRef,
}

impl SqlJoin {
    pub fn new(parent: ColumnRef, child: ColumnRef) -> Self {
        SqlJoin { parent, child }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SqlField {
    /// A leaf read from a column of the object's table. Key columns identify
    /// the entity a row belongs to.
    Column {
        field_name: String,
        column: ColumnRef,
        key: bool,
        hidden: bool,
    },
    /// An object reached through a chain of joins. Chains longer than one hop
    /// pass through junction tables.
    Object { field_name: String, joins: Vec<SqlJoin> },
    /// Determines the concrete type of an interface or union from a column.
    Discriminator {
        column: ColumnRef,
        cases: Vec<(Value, String)>,
    },
}

impl SqlField {
    pub fn column(field_name: impl Into<String>, column: ColumnRef) -> FieldMapping<SqlField> {
        FieldMapping::Backend(SqlField::Column {
            field_name: field_name.into(),
            column,
            key: false,
            hidden: false,
        })
    }

    pub fn key(field_name: impl Into<String>, column: ColumnRef) -> FieldMapping<SqlField> {
        FieldMapping::Backend(SqlField::Column {
            field_name: field_name.into(),
            column,
            key: true,
            hidden: false,
        })
    }

    /// A key column which isn't part of the schema.
    pub fn hidden_key(field_name: impl Into<String>, column: ColumnRef) -> FieldMapping<SqlField> {
        FieldMapping::Backend(SqlField::Column {
            field_name: field_name.into(),
            column,
            key: true,
            hidden: true,
        })
    }

    /// A column only available as a cursor attribute.
    pub fn attribute(field_name: impl Into<String>, column: ColumnRef) -> FieldMapping<SqlField> {
        FieldMapping::Backend(SqlField::Column {
            field_name: field_name.into(),
            column,
            key: false,
            hidden: true,
        })
    }

    pub fn object(field_name: impl Into<String>, joins: Vec<SqlJoin>) -> FieldMapping<SqlField> {
        FieldMapping::Backend(SqlField::Object {
            field_name: field_name.into(),
            joins,
        })
    }

    pub fn discriminator<V, T>(column: ColumnRef, cases: impl IntoIterator<Item = (V, T)>) -> FieldMapping<SqlField>
    where
        V: Into<Value>,
        T: Into<String>,
    {
        FieldMapping::Backend(SqlField::Discriminator {
            column,
            cases: cases.into_iter().map(|(v, t)| (v.into(), t.into())).collect(),
        })
    }

    pub fn as_column(&self) -> Option<&ColumnRef> {
        match self {
            SqlField::Column { column, .. } | SqlField::Discriminator { column, .. } => Some(column),
            SqlField::Object { .. } => None,
        }
    }

    pub fn is_key(&self) -> bool {
        matches!(self, SqlField::Column { key: true, .. })
    }
}

impl BackendField for SqlField {
    fn field_name(&self) -> &str {
        match self {
            SqlField::Column { field_name, .. } | SqlField::Object { field_name, .. } => field_name,
            SqlField::Discriminator { .. } => DISCRIMINATOR,
        }
    }

    fn hidden(&self) -> bool {
        match self {
            SqlField::Column { hidden, .. } => *hidden,
            SqlField::Object { .. } => false,
            SqlField::Discriminator { .. } => true,
        }
    }
}

/// The database and monitor root fields of one mapping run against.
#[derive(Clone)]
struct SqlBackend {
    database: Arc<dyn Queryable>,
    monitor: Arc<dyn SqlMonitor>,
}

/// Builds a [`SqlMapping`]. Root fields are created with
/// [`SqlMappingBuilder::root`] and share the builder's database and monitor.
pub struct SqlMappingBuilder {
    builder: MappingBuilder<SqlField>,
    backend: SqlBackend,
}

impl SqlMappingBuilder {
    pub fn new(schema: SchemaRef, database: Arc<dyn Queryable>) -> Self {
        SqlMappingBuilder {
            builder: SqlMapping::builder(schema),
            backend: SqlBackend {
                database,
                monitor: Arc::new(TracingMonitor),
            },
        }
    }

    pub fn monitor(mut self, monitor: Arc<dyn SqlMonitor>) -> Self {
        self.backend.monitor = monitor;
        self
    }

    /// A root field compiled into one statement per execution.
    pub fn root(&self, field_name: impl Into<String>) -> FieldMapping<SqlField> {
        FieldMapping::Root(RootMapping::new(
            field_name,
            SqlRoot {
                backend: self.backend.clone(),
            },
        ))
    }

    pub fn object(mut self, tpe: impl Into<String>, field_mappings: Vec<FieldMapping<SqlField>>) -> Self {
        self.builder = self.builder.object(tpe, field_mappings);
        self
    }

    pub fn prefixed(
        mut self,
        tpe: impl Into<String>,
        mappings: Vec<(Vec<String>, Vec<FieldMapping<SqlField>>)>,
    ) -> Self {
        self.builder = self.builder.prefixed(tpe, mappings);
        self
    }

    pub fn leaf<F>(mut self, tpe: impl Into<String>, encoder: F) -> Self
    where
        F: Fn(&Value) -> CoreResult<serde_json::Value> + Send + Sync + 'static,
    {
        self.builder = self.builder.leaf(tpe, encoder);
        self
    }

    pub fn select_elaborator<F>(mut self, tpe: impl Into<String>, field_name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Select) -> CoreResult<Query> + Send + Sync + 'static,
    {
        self.builder = self.builder.select_elaborator(tpe, field_name, f);
        self
    }

    pub fn build(self) -> SqlMapping {
        self.builder.build()
    }
}

/// Runs a root field: plans the statement, executes it and hands the rows to
/// a cursor.
struct SqlRoot {
    backend: SqlBackend,
}

#[async_trait]
impl RootCursor<SqlField> for SqlRoot {
    #[tracing::instrument(name = "sql_root", skip_all, fields(field = query.field_name))]
    async fn run(&self, mapping: &SqlMapping, query: RootQuery<'_>) -> CoreResult<(Query, CursorRef)> {
        let plan = SqlPlan::build(mapping, query)?;
        let num_cols = plan.num_fields();

        let (sql, args) = visitor::Sqlite::build(plan.select.clone());
        debug!(sql = %sql, "compiled root field");

        let result = self.backend.database.query_raw(&sql, &args).await?;

        self.backend.monitor.query_mapped(SqlStats {
            query: query.to_query().normalize(),
            sql,
            args,
            num_rows: result.len(),
            num_cols,
        });

        let cursor = SqlCursor::root(mapping.clone(), &plan, query, Arc::new(result));

        Ok((plan.residual, Arc::new(cursor)))
    }
}
