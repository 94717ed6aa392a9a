//! Visitors for reading an abstract SQL syntax tree, generating the query and
//! gathering parameters in the right order.
//!
//! Every literal of the tree becomes a placeholder and is collected into the
//! parameter list in the order the placeholders appear in the SQL text.
mod sqlite;

pub use self::sqlite::Sqlite;

use crate::ast::*;
use itertools::Itertools;

/// A function travelling through the query AST, building the final query
/// string and gathering parameters sent to the database together with the
/// query.
pub trait Visitor {
    /// Placeholder of a parameter.
    const C_PARAM: &'static str;
    /// Quote of an identifier.
    const C_QUOTE: &'static str;

    /// Converts the select into an SQL string and its parameters.
    fn build(select: Select) -> (String, Vec<ParameterizedValue>);

    fn add_parameter(&mut self, value: ParameterizedValue);

    fn visit_select(&mut self, select: Select) -> String;

    fn delimited_identifier(name: &str) -> String {
        let escaped = name.replace(Self::C_QUOTE, &Self::C_QUOTE.repeat(2));
        format!("{}{}{}", Self::C_QUOTE, escaped, Self::C_QUOTE)
    }

    fn visit_table(table: Table) -> String {
        match table.alias {
            Some(alias) => format!(
                "{} AS {}",
                Self::delimited_identifier(&table.name),
                Self::delimited_identifier(&alias)
            ),
            None => Self::delimited_identifier(&table.name),
        }
    }

    fn visit_column(column: Column) -> String {
        match column.table {
            Some(table) => format!(
                "{}.{}",
                Self::delimited_identifier(table.reference()),
                Self::delimited_identifier(&column.name)
            ),
            None => Self::delimited_identifier(&column.name),
        }
    }

    fn visit_columns(&mut self, columns: Vec<Expression>) -> String {
        columns.into_iter().map(|c| self.visit_expression(c)).join(", ")
    }

    fn visit_parameterized(&mut self, value: ParameterizedValue) -> String {
        self.add_parameter(value);
        Self::C_PARAM.to_owned()
    }

    fn visit_expression(&mut self, expression: Expression) -> String {
        match expression {
            Expression::Column(column) => Self::visit_column(*column),
            Expression::Parameterized(value) => self.visit_parameterized(value),
            Expression::Lower(inner) => format!("LOWER({})", self.visit_expression(*inner)),
            Expression::Compare(compare) => self.visit_compare(compare),
            Expression::ConditionTree(tree) => self.visit_conditions(tree),
        }
    }

    fn visit_compare(&mut self, compare: Compare) -> String {
        match compare {
            Compare::Equals(left, right) => self.visit_binary(*left, "=", *right),
            Compare::NotEquals(left, right) => self.visit_binary(*left, "<>", *right),
            Compare::LessThan(left, right) => self.visit_binary(*left, "<", *right),
            Compare::LessThanOrEquals(left, right) => self.visit_binary(*left, "<=", *right),
            Compare::GreaterThan(left, right) => self.visit_binary(*left, ">", *right),
            Compare::GreaterThanOrEquals(left, right) => self.visit_binary(*left, ">=", *right),
            Compare::In(_, selection) if selection.is_empty() => String::from("1=0"),
            Compare::In(left, selection) => {
                let left = self.visit_expression(*left);
                let selection = selection.into_iter().map(|v| self.visit_expression(v)).join(",");

                format!("{left} IN ({selection})")
            }
            Compare::Like(left, right) => self.visit_binary(*left, "LIKE", *right),
            Compare::Null(expr) => format!("{} IS NULL", self.visit_expression(*expr)),
            Compare::NotNull(expr) => format!("{} IS NOT NULL", self.visit_expression(*expr)),
        }
    }

    fn visit_binary(&mut self, left: Expression, op: &str, right: Expression) -> String {
        let left = self.visit_expression(left);
        let right = self.visit_expression(right);

        format!("{left} {op} {right}")
    }

    fn visit_conditions(&mut self, tree: ConditionTree) -> String {
        match tree {
            ConditionTree::And(left, right) => {
                let left = self.visit_expression(*left);
                let right = self.visit_expression(*right);

                format!("({left} AND {right})")
            }
            ConditionTree::Or(left, right) => {
                let left = self.visit_expression(*left);
                let right = self.visit_expression(*right);

                format!("({left} OR {right})")
            }
            ConditionTree::Not(expr) => format!("(NOT {})", self.visit_expression(*expr)),
            ConditionTree::Single(expr) => self.visit_expression(*expr),
            ConditionTree::NoCondition => String::from("1=1"),
            ConditionTree::NegativeCondition => String::from("1=0"),
        }
    }

    fn visit_joins(&mut self, joins: Vec<JoinData>) -> String {
        joins
            .into_iter()
            .map(|join| format!("LEFT JOIN {}", self.visit_join_data(join)))
            .join(" ")
    }

    fn visit_join_data(&mut self, data: JoinData) -> String {
        let table = Self::visit_table(data.table);
        format!("{table} ON {}", self.visit_conditions(data.conditions))
    }

    fn visit_ordering(&mut self, ordering: Ordering) -> String {
        ordering
            .0
            .into_iter()
            .map(|expr| format!("{} ASC", self.visit_expression(expr)))
            .join(", ")
    }
}
