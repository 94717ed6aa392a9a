use crate::ast::{ConditionTree, JoinData, Joinable};

/// Gives a table a name it is referred to by within one statement.
pub trait Aliasable {
    fn alias<T>(self, alias: T) -> Table
    where
        T: Into<String>;
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Table {
    pub name: String,
    pub alias: Option<String>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Table {
            name: name.into(),
            alias: None,
        }
    }

    /// The name columns of this table are qualified with.
    pub fn reference(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

impl From<&str> for Table {
    fn from(name: &str) -> Self {
        Table::new(name)
    }
}

impl From<String> for Table {
    fn from(name: String) -> Self {
        Table::new(name)
    }
}

impl From<&Table> for Table {
    fn from(table: &Table) -> Self {
        table.clone()
    }
}

impl Aliasable for Table {
    fn alias<T>(mut self, alias: T) -> Table
    where
        T: Into<String>,
    {
        self.alias = Some(alias.into());
        self
    }
}

impl Aliasable for &str {
    fn alias<T>(self, alias: T) -> Table
    where
        T: Into<String>,
    {
        Table::new(self).alias(alias)
    }
}

impl Joinable for Table {
    fn on<T>(self, conditions: T) -> JoinData
    where
        T: Into<ConditionTree>,
    {
        JoinData {
            table: self,
            conditions: conditions.into(),
        }
    }
}

impl Joinable for &str {
    fn on<T>(self, conditions: T) -> JoinData
    where
        T: Into<ConditionTree>,
    {
        Table::new(self).on(conditions)
    }
}
