use crate::{OrderSelection, Predicate, Value};
use itertools::Itertools;
use std::fmt;

/// A compiled query.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Query {
    /// Selects a field of the current position.
    Select(Select),
    /// Keeps the elements of a list which satisfy the predicate.
    Filter(Predicate, Box<Query>),
    /// Asserts that the list below yields exactly one element.
    Unique(Box<Query>),
    Group(Vec<Query>),
    /// Evaluates the child only if the current position has the given
    /// concrete type (or a subtype of it).
    Narrow(String, Box<Query>),
    Limit(usize, Box<Query>),
    OrderBy(Vec<OrderSelection>, Box<Query>),
    /// A field resolved by a delegated mapping.
    Component(Component),
    /// A selection against the introspection schema.
    Introspect(Box<Query>),
    #[default]
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub name: String,
    pub alias: Option<String>,
    pub bindings: Vec<Binding>,
    pub child: Box<Query>,
}

impl Select {
    pub fn new(name: impl Into<String>, child: Query) -> Self {
        Select {
            name: name.into(),
            alias: None,
            bindings: Vec::new(),
            child: Box::new(child),
        }
    }

    pub fn with_bindings(mut self, bindings: Vec<Binding>) -> Self {
        self.bindings = bindings;
        self
    }

    pub fn with_alias(mut self, alias: Option<String>) -> Self {
        self.alias = alias;
        self
    }

    /// The key of the field in the response.
    pub fn result_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    pub fn binding(&self, name: &str) -> Option<&Value> {
        self.bindings.iter().find(|b| b.name == name).map(|b| &b.value)
    }

    pub fn with_child(self, child: Query) -> Self {
        Select {
            child: Box::new(child),
            ..self
        }
    }
}

impl From<Select> for Query {
    fn from(select: Select) -> Self {
        Query::Select(select)
    }
}

/// A field whose value is produced by a sibling mapping. The join is looked up
/// by `(type_name, field_name)` when the component is interpreted.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub type_name: String,
    pub field_name: String,
    pub child: Box<Query>,
}

/// A named argument value.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub name: String,
    pub value: Value,
}

impl Binding {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Binding {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl Query {
    pub fn select(name: impl Into<String>, child: Query) -> Self {
        Query::Select(Select::new(name, child))
    }

    /// A leaf selection.
    pub fn field(name: impl Into<String>) -> Self {
        Query::select(name, Query::Empty)
    }

    pub fn filter(predicate: Predicate, child: Query) -> Self {
        Query::Filter(predicate, Box::new(child))
    }

    pub fn unique(child: Query) -> Self {
        Query::Unique(Box::new(child))
    }

    pub fn narrow(type_name: impl Into<String>, child: Query) -> Self {
        Query::Narrow(type_name.into(), Box::new(child))
    }

    /// Groups the queries, collapsing trivial groups.
    pub fn group(queries: Vec<Query>) -> Self {
        Query::Group(queries).normalize_group()
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Query::Empty)
    }

    /// The members of a group, or the query itself.
    pub fn ungroup(&self) -> Vec<&Query> {
        match self {
            Query::Group(queries) => queries.iter().flat_map(Query::ungroup).collect(),
            Query::Empty => Vec::new(),
            other => vec![other],
        }
    }

    pub fn into_ungrouped(self) -> Vec<Query> {
        match self {
            Query::Group(queries) => queries.into_iter().flat_map(Query::into_ungrouped).collect(),
            Query::Empty => Vec::new(),
            other => vec![other],
        }
    }

    /// Canonical form used for correlating equal queries: nested groups are
    /// flattened, empty members are dropped, single-member groups collapse and
    /// bindings are ordered by name.
    pub fn normalize(&self) -> Query {
        match self {
            Query::Select(select) => {
                let mut bindings = select.bindings.clone();
                bindings.sort_by(|a, b| a.name.cmp(&b.name));

                Query::Select(Select {
                    name: select.name.clone(),
                    alias: select.alias.clone(),
                    bindings,
                    child: Box::new(select.child.normalize()),
                })
            }
            Query::Filter(p, child) => Query::Filter(p.clone(), Box::new(child.normalize())),
            Query::Unique(child) => Query::Unique(Box::new(child.normalize())),
            Query::Narrow(t, child) => Query::Narrow(t.clone(), Box::new(child.normalize())),
            Query::Limit(n, child) => Query::Limit(*n, Box::new(child.normalize())),
            Query::OrderBy(o, child) => Query::OrderBy(o.clone(), Box::new(child.normalize())),
            Query::Introspect(child) => Query::Introspect(Box::new(child.normalize())),
            Query::Component(c) => Query::Component(Component {
                type_name: c.type_name.clone(),
                field_name: c.field_name.clone(),
                child: Box::new(c.child.normalize()),
            }),
            Query::Group(queries) => Query::Group(queries.iter().map(Query::normalize).collect()).normalize_group(),
            Query::Empty => Query::Empty,
        }
    }

    fn normalize_group(self) -> Query {
        let mut members = self.into_ungrouped();

        match members.len() {
            0 => Query::Empty,
            1 => members.remove(0),
            _ => Query::Group(members),
        }
    }

    /// Rebuilds the query with `f` applied to the child of every wrapping
    /// node down to (and excluding) the first `Select`, `Group` or `Empty`.
    pub fn map_innermost(self, f: impl FnOnce(Query) -> Query) -> Query {
        match self {
            Query::Filter(p, child) => Query::Filter(p, Box::new(child.map_innermost(f))),
            Query::Unique(child) => Query::Unique(Box::new(child.map_innermost(f))),
            Query::Limit(n, child) => Query::Limit(n, Box::new(child.map_innermost(f))),
            Query::OrderBy(o, child) => Query::OrderBy(o, Box::new(child.map_innermost(f))),
            other => f(other),
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Select(select) => {
                if let Some(alias) = &select.alias {
                    write!(f, "{alias}:")?;
                }

                f.write_str(&select.name)?;

                if !select.bindings.is_empty() {
                    let args = select.bindings.iter().map(|b| format!("{}: {}", b.name, b.value)).join(", ");
                    write!(f, "({args})")?;
                }

                if !select.child.is_empty() {
                    write!(f, " {{ {} }}", select.child)?;
                }

                Ok(())
            }
            Query::Filter(p, child) => write!(f, "filter({p}, {child})"),
            Query::Unique(child) => write!(f, "unique({child})"),
            Query::Group(queries) => write!(f, "{}", queries.iter().join(", ")),
            Query::Narrow(t, child) => write!(f, "... on {t} {{ {child} }}"),
            Query::Limit(n, child) => write!(f, "limit({n}, {child})"),
            Query::OrderBy(o, child) => write!(f, "order_by({}, {child})", o.iter().map(|s| &s.term).join(", ")),
            Query::Component(c) => write!(f, "component({}.{}, {})", c.type_name, c.field_name, c.child),
            Query::Introspect(child) => write!(f, "introspect({child})"),
            Query::Empty => f.write_str("<empty>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Term;
    use pretty_assertions::assert_eq;

    #[test]
    fn normalize_flattens_groups_and_sorts_bindings() {
        let query = Query::Select(
            Select::new(
                "cities",
                Query::Group(vec![
                    Query::Group(vec![Query::field("name"), Query::Empty]),
                    Query::Group(vec![Query::field("id")]),
                ]),
            )
            .with_bindings(vec![Binding::new("b", 1), Binding::new("a", 2)]),
        );

        let expected = Query::Select(
            Select::new("cities", Query::Group(vec![Query::field("name"), Query::field("id")]))
                .with_bindings(vec![Binding::new("a", 2), Binding::new("b", 1)]),
        );

        assert_eq!(query.normalize(), expected);
    }

    #[test]
    fn single_member_groups_collapse() {
        assert_eq!(Query::group(vec![Query::field("a")]), Query::field("a"));
        assert_eq!(Query::group(vec![]), Query::Empty);
    }

    #[test]
    fn map_innermost_reaches_through_wrappers() {
        let query = Query::unique(Query::filter(Predicate::True, Query::field("a")));
        let mapped = query.map_innermost(|_| Query::field("b"));

        assert_eq!(mapped, Query::unique(Query::filter(Predicate::True, Query::field("b"))));
    }

    #[test]
    fn display_renders_compactly() {
        let query = Query::select(
            "cities",
            Query::filter(
                Predicate::like(Term::field("name"), "Linh%", false),
                Query::field("name"),
            ),
        );

        assert_eq!(query.to_string(), "cities { filter(name like \"Linh%\", name) }");
    }
}
