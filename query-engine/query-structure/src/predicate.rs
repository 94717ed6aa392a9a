use crate::Value;
use itertools::Itertools;
use std::fmt;

/// An operand of a predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    /// Field names navigated from the filtered entity.
    Path(Vec<String>),
    Const(Value),
}

impl Term {
    pub fn path<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Term::Path(segments.into_iter().map(Into::into).collect())
    }

    pub fn field(name: impl Into<String>) -> Self {
        Term::Path(vec![name.into()])
    }

    pub fn as_path(&self) -> Option<&[String]> {
        match self {
            Term::Path(p) => Some(p),
            Term::Const(_) => None,
        }
    }
}

impl From<Value> for Term {
    fn from(value: Value) -> Self {
        Term::Const(value)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Path(p) => write!(f, "{}", p.join(".")),
            Term::Const(v) => v.fmt(f),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    True,
    False,
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),
    Eql(Term, Term),
    NEql(Term, Term),
    Lt(Term, Term),
    LtEql(Term, Term),
    Gt(Term, Term),
    GtEql(Term, Term),
    /// SQL `LIKE` pattern match with `%` and `_` wildcards.
    Like {
        term: Term,
        pattern: String,
        case_insensitive: bool,
    },
    In(Term, Vec<Value>),
    /// `IsNull(term, true)` holds for null terms, `IsNull(term, false)` for
    /// non-null ones.
    IsNull(Term, bool),
}

impl Predicate {
    pub fn eql(path: Term, value: impl Into<Value>) -> Self {
        Predicate::Eql(path, Term::Const(value.into()))
    }

    pub fn like(term: Term, pattern: impl Into<String>, case_insensitive: bool) -> Self {
        Predicate::Like {
            term,
            pattern: pattern.into(),
            case_insensitive,
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        match self {
            Predicate::True => Predicate::False,
            Predicate::False => Predicate::True,
            Predicate::Not(inner) => *inner,
            other => Predicate::Not(Box::new(other)),
        }
    }

    pub fn and(self, other: Predicate) -> Self {
        match (self, other) {
            (Predicate::True, p) | (p, Predicate::True) => p,
            (Predicate::False, _) | (_, Predicate::False) => Predicate::False,
            (a, b) => Predicate::And(Box::new(a), Box::new(b)),
        }
    }

    pub fn or(self, other: Predicate) -> Self {
        match (self, other) {
            (Predicate::False, p) | (p, Predicate::False) => p,
            (Predicate::True, _) | (_, Predicate::True) => Predicate::True,
            (a, b) => Predicate::Or(Box::new(a), Box::new(b)),
        }
    }

    /// Conjunction of all predicates, `True` when empty.
    pub fn all(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        predicates.into_iter().fold(Predicate::True, Predicate::and)
    }

    /// Every operand of the predicate in declaration order.
    pub fn terms(&self) -> Vec<&Term> {
        match self {
            Predicate::True | Predicate::False => Vec::new(),
            Predicate::And(a, b) | Predicate::Or(a, b) => a.terms().into_iter().chain(b.terms()).collect(),
            Predicate::Not(p) => p.terms(),
            Predicate::Eql(a, b)
            | Predicate::NEql(a, b)
            | Predicate::Lt(a, b)
            | Predicate::LtEql(a, b)
            | Predicate::Gt(a, b)
            | Predicate::GtEql(a, b) => vec![a, b],
            Predicate::Like { term, .. } | Predicate::In(term, _) | Predicate::IsNull(term, _) => vec![term],
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::True => f.write_str("true"),
            Predicate::False => f.write_str("false"),
            Predicate::And(a, b) => write!(f, "({a} && {b})"),
            Predicate::Or(a, b) => write!(f, "({a} || {b})"),
            Predicate::Not(p) => write!(f, "!{p}"),
            Predicate::Eql(a, b) => write!(f, "{a} == {b}"),
            Predicate::NEql(a, b) => write!(f, "{a} != {b}"),
            Predicate::Lt(a, b) => write!(f, "{a} < {b}"),
            Predicate::LtEql(a, b) => write!(f, "{a} <= {b}"),
            Predicate::Gt(a, b) => write!(f, "{a} > {b}"),
            Predicate::GtEql(a, b) => write!(f, "{a} >= {b}"),
            Predicate::Like {
                term,
                pattern,
                case_insensitive,
            } => {
                let op = if *case_insensitive { "ilike" } else { "like" };
                write!(f, "{term} {op} \"{pattern}\"")
            }
            Predicate::In(term, values) => write!(f, "{term} in [{}]", values.iter().join(", ")),
            Predicate::IsNull(term, true) => write!(f, "{term} is null"),
            Predicate::IsNull(term, false) => write!(f, "{term} is not null"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conjunction_drops_trivial_operands() {
        let p = Predicate::eql(Term::field("code"), "CHN");

        assert_eq!(Predicate::True.and(p.clone()), p);
        assert_eq!(Predicate::all(Vec::new()), Predicate::True);
        assert_eq!(p.clone().and(Predicate::False), Predicate::False);
        assert_eq!(p.clone().not().not(), p);
    }

    #[test]
    fn display_is_readable() {
        let p = Predicate::like(Term::field("name"), "Linh%", false).and(Predicate::IsNull(Term::field("x"), false));

        assert_eq!(p.to_string(), "(name like \"Linh%\" && x is not null)");
    }
}
