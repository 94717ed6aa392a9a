//! Compilation of a root field into a single statement.
//!
//! The root type's table is selected `FROM`, every object field below it is
//! `LEFT JOIN`ed through the column pairs of its mapping, so sibling joins end
//! up in the same statement. Filters are pushed into SQL where they can be:
//! filters of the root go into `WHERE`, filters of nested objects into the `ON`
//! clause of the object's join so parents without matching children survive.
//! Everything that isn't pushed stays in the residual query which the
//! interpreter evaluates over the rebuilt entities.

use crate::{
    ast::{self, lower, Aliasable, Column, Comparable, ConditionTree, Expression, Joinable, Orderable, ParameterizedValue, Table},
    ColumnRef, SqlError, SqlField, SqlJoin, SqlMapping, SqlResult, DISCRIMINATOR,
};
use query_core::{BackendField, CoreError, FieldMapping, RootQuery};
use query_structure::{OrderSelection, Predicate, Query, Select, Term};
use std::{collections::HashMap, sync::Arc};
use tracing::trace;

/// An entity table of a plan and where its columns are in the rows.
#[derive(Debug, Clone)]
pub(crate) struct TableNode {
    pub alias: String,
    pub table: String,
    /// Row positions of the key columns.
    pub keys: Vec<usize>,
    /// Column name to row position.
    pub columns: HashMap<String, usize>,
    /// Object field name to node index.
    pub children: HashMap<String, usize>,
    /// Whether conditions were pushed into the join of this node.
    pub filtered: bool,
}

pub(crate) struct SqlPlan {
    pub select: ast::Select,
    /// All entity tables, the root first.
    pub nodes: Arc<Vec<TableNode>>,
    pub residual: Query,
    num_fields: usize,
}

impl SqlPlan {
    pub fn build(mapping: &SqlMapping, query: RootQuery<'_>) -> SqlResult<SqlPlan> {
        let mut planner = Planner {
            mapping,
            nodes: Vec::new(),
            columns: Vec::new(),
            joins: Vec::new(),
            conditions: Vec::new(),
            aliases: 0,
            num_fields: 0,
        };

        let path = vec![query.field_name.to_owned()];
        let tpe = query.tpe.underlying_name();

        let alias = planner.next_alias();
        let root = planner.node(&path, tpe, alias)?;
        let residual = planner.plan_list(root, &path, tpe, query.child, Target::Where, true)?;

        trace!(field = query.field_name, residual = %residual, "planned root field");

        Ok(planner.finish(residual))
    }

    /// Number of leaf fields the query requested. Key, discriminator and
    /// required columns selected for rebuilding the result don't count.
    pub fn num_fields(&self) -> usize {
        self.num_fields
    }
}

/// Where pushed conditions of a list end up.
#[derive(Debug, Clone, Copy)]
enum Target {
    Where,
    Join(usize),
}

struct Planner<'a> {
    mapping: &'a SqlMapping,
    nodes: Vec<TableNode>,
    columns: Vec<Column>,
    joins: Vec<(Table, ConditionTree)>,
    conditions: Vec<ConditionTree>,
    aliases: usize,
    num_fields: usize,
}

impl Planner<'_> {
    fn next_alias(&mut self) -> String {
        let alias = format!("t{}", self.aliases);
        self.aliases += 1;
        alias
    }

    fn finish(self, residual: Query) -> SqlPlan {
        let root = &self.nodes[0];
        let mut select = ast::Select::from(root.table.as_str().alias(root.alias.clone()));

        for column in &self.columns {
            select = select.column(column.clone());
        }

        for (table, conditions) in self.joins {
            select = select.left_join(table.on(conditions));
        }

        select = select.and_where(ConditionTree::all(self.conditions));

        for node in &self.nodes {
            for key in &node.keys {
                select = select.order_by(self.columns[*key].clone().ascend());
            }
        }

        SqlPlan {
            select,
            num_fields: self.num_fields,
            nodes: Arc::new(self.nodes),
            residual,
        }
    }

    /// Adds the table of an entity type, selecting its keys and, for abstract
    /// types, its discriminator.
    fn node(&mut self, path: &[String], tpe: &str, alias: String) -> SqlResult<usize> {
        let keys = self.key_columns(path, tpe);

        let Some(table) = keys.first().map(|k| k.table.clone()) else {
            return Err(SqlError::MissingKey(tpe.to_owned()));
        };

        let index = self.nodes.len();

        self.nodes.push(TableNode {
            alias,
            table,
            keys: Vec::new(),
            columns: HashMap::new(),
            children: HashMap::new(),
            filtered: false,
        });

        for key in &keys {
            let position = self.own_column(index, tpe, key)?;
            self.nodes[index].keys.push(position);
        }

        if self.mapping.schema().is_abstract(tpe) {
            match self.mapping.backend_field(path, tpe, DISCRIMINATOR) {
                Some(SqlField::Discriminator { column, .. }) => {
                    self.own_column(index, DISCRIMINATOR, column)?;
                }
                _ => {
                    return Err(SqlError::UnsupportedQuery(format!(
                        "abstract type '{tpe}' has no discriminator"
                    )));
                }
            }
        }

        Ok(index)
    }

    /// The key columns of a type, falling back to those of its interfaces.
    fn key_columns(&self, path: &[String], tpe: &str) -> Vec<ColumnRef> {
        let direct: Vec<ColumnRef> = self
            .mapping
            .object_mapping(path, tpe)
            .map(|om| {
                om.field_mappings
                    .iter()
                    .filter_map(FieldMapping::as_backend)
                    .filter(|field| field.is_key())
                    .filter_map(|field| field.as_column().cloned())
                    .collect()
            })
            .unwrap_or_default();

        if !direct.is_empty() {
            return direct;
        }

        let schema = self.mapping.schema();
        let interfaces = schema.find_type(tpe).map(|t| t.interfaces()).unwrap_or_default();

        interfaces
            .iter()
            .map(|interface| self.key_columns(path, interface))
            .find(|keys| !keys.is_empty())
            .unwrap_or_default()
    }

    /// Selects a column of the node's table once, returning its row position.
    fn own_column(&mut self, node: usize, field: &str, column: &ColumnRef) -> SqlResult<usize> {
        let table_node = &self.nodes[node];

        if column.table != table_node.table {
            return Err(SqlError::ForeignColumn {
                field: field.to_owned(),
                column: column.to_string(),
                table: table_node.table.clone(),
            });
        }

        if let Some(position) = table_node.columns.get(&column.column) {
            return Ok(*position);
        }

        let position = self.columns.len();
        self.columns
            .push(Column::new(column.column.clone()).table(table_node.alias.as_str()));
        self.nodes[node].columns.insert(column.column.clone(), position);

        Ok(position)
    }

    /// Peels the list operations off a query. Filters are pushed to `target`
    /// unless a limit was applied before them.
    fn plan_list(
        &mut self,
        node: usize,
        path: &[String],
        tpe: &str,
        query: &Query,
        target: Target,
        pushable: bool,
    ) -> SqlResult<Query> {
        match query {
            Query::Filter(predicate, child) if pushable => {
                let condition = self.condition(node, path, tpe, predicate)?;
                self.push_condition(node, target, condition);

                self.plan_list(node, path, tpe, child, target, pushable)
            }
            Query::Filter(predicate, child) => {
                for term in predicate.terms() {
                    self.select_term(node, path, tpe, term)?;
                }

                let child = self.plan_list(node, path, tpe, child, target, pushable)?;
                Ok(Query::filter(predicate.clone(), child))
            }
            Query::Unique(child) => Ok(Query::unique(self.plan_list(node, path, tpe, child, target, pushable)?)),
            Query::OrderBy(selections, child) => {
                for OrderSelection { term, .. } in selections {
                    self.select_term(node, path, tpe, term)?;
                }

                let child = self.plan_list(node, path, tpe, child, target, pushable)?;
                Ok(Query::OrderBy(selections.clone(), Box::new(child)))
            }
            Query::Limit(n, child) => {
                let child = self.plan_list(node, path, tpe, child, target, false)?;
                Ok(Query::Limit(*n, Box::new(child)))
            }
            other => self.plan_object(node, path, tpe, other),
        }
    }

    fn push_condition(&mut self, node: usize, target: Target, condition: ConditionTree) {
        match target {
            Target::Where => self.conditions.push(condition),
            Target::Join(index) => {
                let existing = std::mem::take(&mut self.joins[index].1);
                self.joins[index].1 = existing.conjoin(condition);
                self.nodes[node].filtered = true;
            }
        }
    }

    /// Selects what an operand of an evaluated predicate or ordering reads.
    fn select_term(&mut self, node: usize, path: &[String], tpe: &str, term: &Term) -> SqlResult<()> {
        match term {
            Term::Const(_) => Ok(()),
            Term::Path(segments) if segments.len() == 1 => {
                self.plan_select(node, path, tpe, &Select::new(segments[0].clone(), Query::Empty))?;
                Ok(())
            }
            Term::Path(_) => Err(SqlError::UnsupportedQuery(format!("path {term}"))),
        }
    }

    fn plan_object(&mut self, node: usize, path: &[String], tpe: &str, query: &Query) -> SqlResult<Query> {
        match query {
            Query::Group(queries) => {
                let planned = queries
                    .iter()
                    .map(|q| self.plan_object(node, path, tpe, q))
                    .collect::<SqlResult<Vec<_>>>()?;

                Ok(Query::Group(planned))
            }
            Query::Select(select) if select.name == "__typename" => Ok(query.clone()),
            Query::Select(select) => {
                let planned = self.plan_select(node, path, tpe, select)?;

                if self.is_leaf(path, tpe, &select.name) {
                    self.num_fields += 1;
                }

                Ok(Query::Select(planned))
            }
            Query::Narrow(type_name, child) => Ok(Query::narrow(
                type_name.clone(),
                self.plan_object(node, path, type_name, child)?,
            )),
            Query::Component(_) => {
                self.select_all_columns(node, path, tpe)?;
                Ok(query.clone())
            }
            Query::Empty => Ok(Query::Empty),
            other => Err(SqlError::UnsupportedQuery(other.to_string())),
        }
    }

    fn plan_select(&mut self, node: usize, path: &[String], tpe: &str, select: &Select) -> SqlResult<Select> {
        let missing = || {
            SqlError::Core(CoreError::MissingFieldMapping {
                field: select.name.clone(),
                tpe: tpe.to_owned(),
            })
        };

        match self.mapping.field_mapping(path, tpe, &select.name) {
            Some(FieldMapping::Backend(SqlField::Column { column, .. })) => {
                let column = column.clone();
                self.own_column(node, &select.name, &column)?;

                Ok(select.clone())
            }
            Some(FieldMapping::Backend(SqlField::Object { joins, .. })) => {
                let joins = joins.clone();

                let child_tpe = self
                    .mapping
                    .schema()
                    .field(tpe, &select.name)
                    .map(|f| f.tpe.underlying_name().to_owned())
                    .ok_or_else(missing)?;

                let mut child_path = path.to_vec();
                child_path.push(select.name.clone());

                let (child, join) = self.join(node, &child_path, &child_tpe, &select.name, &joins, &select.child)?;
                let residual = self.plan_list(child, &child_path, &child_tpe, &select.child, Target::Join(join), true)?;

                Ok(select.clone().with_child(residual))
            }
            Some(FieldMapping::CursorField(field)) => {
                let required = field.required.clone();
                self.select_required(node, path, tpe, &required)?;

                Ok(select.clone())
            }
            Some(FieldMapping::CursorAttribute(attribute)) => {
                let required = attribute.required.clone();
                self.select_required(node, path, tpe, &required)?;

                Ok(select.clone())
            }
            Some(FieldMapping::Delegate(_)) => {
                self.select_all_columns(node, path, tpe)?;
                Ok(select.clone())
            }
            Some(FieldMapping::Backend(SqlField::Discriminator { .. }) | FieldMapping::Root(_)) | None => {
                Err(missing())
            }
        }
    }

    fn is_leaf(&self, path: &[String], tpe: &str, field_name: &str) -> bool {
        matches!(
            self.mapping.field_mapping(path, tpe, field_name),
            Some(
                FieldMapping::Backend(SqlField::Column { .. })
                    | FieldMapping::CursorField(_)
                    | FieldMapping::CursorAttribute(_)
            )
        )
    }

    fn select_required(&mut self, node: usize, path: &[String], tpe: &str, required: &[String]) -> SqlResult<()> {
        for name in required {
            self.plan_select(node, path, tpe, &Select::new(name.clone(), Query::Empty))?;
        }

        Ok(())
    }

    /// Makes every column of the node's table mapped for the type available,
    /// for joins of delegated fields to read from.
    fn select_all_columns(&mut self, node: usize, path: &[String], tpe: &str) -> SqlResult<()> {
        let table = self.nodes[node].table.clone();

        let columns: Vec<(String, ColumnRef)> = self
            .mapping
            .object_mapping(path, tpe)
            .map(|om| {
                om.field_mappings
                    .iter()
                    .filter_map(FieldMapping::as_backend)
                    .filter_map(|field| match field {
                        SqlField::Column { column, .. } if column.table == table => {
                            Some((field.field_name().to_owned(), column.clone()))
                        }
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();

        for (field, column) in columns {
            self.own_column(node, &field, &column)?;
        }

        Ok(())
    }

    /// Joins the table of an object field, reusing the join when the field is
    /// selected more than once.
    fn join(
        &mut self,
        node: usize,
        path: &[String],
        tpe: &str,
        field_name: &str,
        joins: &[SqlJoin],
        child: &Query,
    ) -> SqlResult<(usize, usize)> {
        if let Some(existing) = self.nodes[node].children.get(field_name).copied() {
            if self.nodes[existing].filtered || has_filter(child) {
                return Err(SqlError::UnsupportedQuery(format!(
                    "field '{field_name}' selected more than once with filters"
                )));
            }

            let join = self.join_index(existing);
            return Ok((existing, join));
        }

        if joins.is_empty() {
            return Err(SqlError::UnsupportedQuery(format!("object field '{field_name}' without joins")));
        }

        let mut parent_alias = self.nodes[node].alias.clone();
        let mut parent_table = self.nodes[node].table.clone();

        for hop in joins {
            if hop.parent.table != parent_table {
                return Err(SqlError::ForeignColumn {
                    field: field_name.to_owned(),
                    column: hop.parent.to_string(),
                    table: parent_table,
                });
            }

            let alias = self.next_alias();

            let condition = Column::new(hop.parent.column.clone())
                .table(parent_alias.as_str())
                .equals(Column::new(hop.child.column.clone()).table(alias.as_str()));

            self.joins
                .push((hop.child.table.as_str().alias(alias.clone()), condition.into()));

            parent_alias = alias;
            parent_table = hop.child.table.clone();
        }

        let child_node = self.node(path, tpe, parent_alias)?;

        if self.nodes[child_node].table != parent_table {
            return Err(SqlError::ForeignColumn {
                field: field_name.to_owned(),
                column: format!("{}.*", self.nodes[child_node].table),
                table: parent_table,
            });
        }

        self.nodes[node].children.insert(field_name.to_owned(), child_node);

        Ok((child_node, self.joins.len() - 1))
    }

    /// The join which introduced a node's alias.
    fn join_index(&self, node: usize) -> usize {
        let alias = &self.nodes[node].alias;

        self.joins
            .iter()
            .position(|(table, _)| table.alias.as_ref() == Some(alias))
            .unwrap_or_default()
    }

    fn condition(&self, node: usize, path: &[String], tpe: &str, predicate: &Predicate) -> SqlResult<ConditionTree> {
        let unsupported = || SqlError::UnsupportedPredicate(predicate.to_string());
        let expr = |term: &Term| self.expression(node, path, tpe, term).ok_or_else(unsupported);

        let compare = match predicate {
            Predicate::True => return Ok(ConditionTree::NoCondition),
            Predicate::False => return Ok(ConditionTree::NegativeCondition),
            Predicate::And(a, b) => {
                let a = self.condition(node, path, tpe, a)?;
                let b = self.condition(node, path, tpe, b)?;

                return Ok(ConditionTree::and(a, b));
            }
            Predicate::Or(a, b) => {
                let a = self.condition(node, path, tpe, a)?;
                let b = self.condition(node, path, tpe, b)?;

                return Ok(ConditionTree::or(a, b));
            }
            Predicate::Not(p) => return Ok(ConditionTree::not(self.condition(node, path, tpe, p)?)),
            Predicate::Eql(a, Term::Const(v)) | Predicate::Eql(Term::Const(v), a) if v.is_empty() => expr(a)?.is_null(),
            Predicate::NEql(a, Term::Const(v)) | Predicate::NEql(Term::Const(v), a) if v.is_empty() => {
                expr(a)?.is_not_null()
            }
            Predicate::Eql(a, b) => expr(a)?.equals(expr(b)?),
            Predicate::NEql(a, b) => expr(a)?.not_equals(expr(b)?),
            Predicate::Lt(a, b) => expr(a)?.less_than(expr(b)?),
            Predicate::LtEql(a, b) => expr(a)?.less_than_or_equals(expr(b)?),
            Predicate::Gt(a, b) => expr(a)?.greater_than(expr(b)?),
            Predicate::GtEql(a, b) => expr(a)?.greater_than_or_equals(expr(b)?),
            Predicate::Like {
                term,
                pattern,
                case_insensitive,
            } => {
                let pattern = Expression::from(ParameterizedValue::Text(pattern.clone()));

                if *case_insensitive {
                    lower(expr(term)?).like(lower(pattern))
                } else {
                    expr(term)?.like(pattern)
                }
            }
            Predicate::In(term, values) => {
                let values = values
                    .iter()
                    .map(ParameterizedValue::try_from_value)
                    .collect::<SqlResult<Vec<_>>>()?;

                expr(term)?.in_selection(values)
            }
            Predicate::IsNull(term, true) => expr(term)?.is_null(),
            Predicate::IsNull(term, false) => expr(term)?.is_not_null(),
        };

        Ok(compare.into())
    }

    /// Constants become parameters, single field paths the field's column.
    /// Anything else can't be expressed over the node's table.
    fn expression(&self, node: usize, path: &[String], tpe: &str, term: &Term) -> Option<Expression> {
        match term {
            Term::Const(value) => ParameterizedValue::try_from_value(value).ok().map(Expression::from),
            Term::Path(segments) if segments.len() == 1 => {
                let table_node = &self.nodes[node];

                match self.mapping.backend_field(path, tpe, &segments[0])? {
                    SqlField::Column { column, .. } if column.table == table_node.table => Some(
                        Column::new(column.column.clone())
                            .table(table_node.alias.as_str())
                            .into(),
                    ),
                    _ => None,
                }
            }
            Term::Path(_) => None,
        }
    }
}

/// Whether a list query filters before reaching its object query.
fn has_filter(query: &Query) -> bool {
    match query {
        Query::Filter(..) => true,
        Query::Unique(child) | Query::Limit(_, child) | Query::OrderBy(_, child) => has_filter(child),
        _ => false,
    }
}
