use crate::{ast::*, visitor::Visitor};

/// A visitor to generate queries for the SQLite database.
///
/// The returned parameter values implement the `ToSql` trait from rusqlite and
/// can be used directly with the database.
pub struct Sqlite {
    parameters: Vec<ParameterizedValue>,
}

impl Visitor for Sqlite {
    const C_PARAM: &'static str = "?";
    const C_QUOTE: &'static str = "`";

    fn build(select: Select) -> (String, Vec<ParameterizedValue>) {
        let mut sqlite = Sqlite { parameters: Vec::new() };
        let sql = sqlite.visit_select(select);

        (sql, sqlite.parameters)
    }

    fn add_parameter(&mut self, value: ParameterizedValue) {
        self.parameters.push(value);
    }

    fn visit_select(&mut self, select: Select) -> String {
        let mut result = vec!["SELECT".to_string()];

        if select.columns.is_empty() {
            result.push(String::from("*"));
        } else {
            result.push(self.visit_columns(select.columns));
        }

        if let Some(table) = select.table {
            result.push(format!("FROM {}", Self::visit_table(table)));
        }

        if !select.joins.is_empty() {
            result.push(self.visit_joins(select.joins));
        }

        if let Some(conditions) = select.conditions {
            result.push(format!("WHERE {}", self.visit_conditions(conditions)));
        }

        if !select.ordering.is_empty() {
            result.push(format!("ORDER BY {}", self.visit_ordering(select.ordering)));
        }

        result.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn expected_values<T>(sql: &'static str, params: Vec<T>) -> (String, Vec<ParameterizedValue>)
    where
        T: Into<ParameterizedValue>,
    {
        (String::from(sql), params.into_iter().map(|p| p.into()).collect())
    }

    #[test]
    fn test_select_star_from() {
        let (sql, params) = Sqlite::build(Select::from("musti"));

        assert_eq!("SELECT * FROM `musti`", sql);
        assert_eq!(Vec::<ParameterizedValue>::new(), params);
    }

    #[test]
    fn test_select_fields_from_aliased_table() {
        let table = "cat".alias("t0");
        let query = Select::from(table.clone())
            .column(("t0", "paw"))
            .column(Column::new("nose").table(table));

        let (sql, _) = Sqlite::build(query);

        assert_eq!("SELECT `t0`.`paw`, `t0`.`nose` FROM `cat` AS `t0`", sql);
    }

    #[test]
    fn test_parameters_follow_placeholder_order() {
        let expected = expected_values(
            "SELECT `name` FROM `city` WHERE (`name` LIKE ? AND `population` > ?)",
            vec![ParameterizedValue::from("Linh%"), ParameterizedValue::from(1000i64)],
        );

        let conditions = ConditionTree::and(
            Column::new("name").like(ParameterizedValue::from("Linh%")),
            Column::new("population").greater_than(ParameterizedValue::from(1000i64)),
        );

        let (sql, params) = Sqlite::build(Select::from("city").column("name").and_where(conditions));

        assert_eq!(expected.0, sql);
        assert_eq!(expected.1, params);
    }

    #[test]
    fn test_case_insensitive_like() {
        let condition = lower(Column::new("name")).like(lower(ParameterizedValue::from("linh%")));
        let (sql, params) = Sqlite::build(Select::from("city").column("name").and_where(condition));

        assert_eq!("SELECT `name` FROM `city` WHERE LOWER(`name`) LIKE LOWER(?)", sql);
        assert_eq!(vec![ParameterizedValue::from("linh%")], params);
    }

    #[test]
    fn test_left_join_with_ordering() {
        let join = "country"
            .alias("t1")
            .on(ConditionTree::and(
                Column::from(("t0", "countrycode")).equals(Column::from(("t1", "code"))),
                Column::from(("t1", "code")).in_selection(vec![
                    ParameterizedValue::from("NLD"),
                    ParameterizedValue::from("CHN"),
                ]),
            ));

        let query = Select::from("city".alias("t0"))
            .column(("t0", "id"))
            .column(("t1", "code"))
            .left_join(join)
            .order_by(Column::from(("t0", "id")).ascend())
            .order_by(Column::from(("t1", "code")).ascend());

        let (sql, params) = Sqlite::build(query);

        assert_eq!(
            "SELECT `t0`.`id`, `t1`.`code` FROM `city` AS `t0` LEFT JOIN `country` AS `t1` ON (`t0`.`countrycode` = `t1`.`code` AND `t1`.`code` IN (?,?)) ORDER BY `t0`.`id` ASC, `t1`.`code` ASC",
            sql
        );
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_empty_in_and_negative_conditions() {
        let query = Select::from("city")
            .column(("city", "id"))
            .and_where(Column::new("id").in_selection(Vec::<ParameterizedValue>::new()))
            .and_where(ConditionTree::not(ConditionTree::NegativeCondition));

        let (sql, params) = Sqlite::build(query);

        assert_eq!("SELECT `city`.`id` FROM `city` WHERE (1=0 AND (NOT 1=0))", sql);
        assert!(params.is_empty());
    }

    #[test]
    fn test_identifiers_are_escaped() {
        let (sql, _) = Sqlite::build(Select::from("we`ird").column("na`me"));

        assert_eq!("SELECT `na``me` FROM `we``ird`", sql);
    }
}
