//! In-memory evaluation of predicates and orderings over cursors.

use crate::{CoreError, CoreResult, Cursor, CursorRef, FieldResolution, Mapping};
use query_structure::{NullsOrder, OrderSelection, Predicate, SortOrder, Term};
use query_value::Value;
use regex::Regex;
use std::cmp::Ordering;

pub(crate) fn eval(mapping: &dyn Mapping, predicate: &Predicate, cursor: &dyn Cursor) -> CoreResult<bool> {
    let value = |term: &Term| term_value(mapping, term, cursor);

    let compare = |a: &Term, b: &Term, accept: fn(Ordering) -> bool| -> CoreResult<bool> {
        let rhs = value(b)?;
        Ok(any(&value(a)?, |lhs| lhs.compare(&rhs).is_some_and(accept)))
    };

    Ok(match predicate {
        Predicate::True => true,
        Predicate::False => false,
        Predicate::And(a, b) => eval(mapping, a, cursor)? && eval(mapping, b, cursor)?,
        Predicate::Or(a, b) => eval(mapping, a, cursor)? || eval(mapping, b, cursor)?,
        Predicate::Not(p) => !eval(mapping, p, cursor)?,
        Predicate::Eql(a, b) => {
            let rhs = value(b)?;
            any(&value(a)?, |lhs| lhs.loosely_equals(&rhs))
        }
        Predicate::NEql(a, b) => {
            let rhs = value(b)?;
            !any(&value(a)?, |lhs| lhs.loosely_equals(&rhs))
        }
        Predicate::Lt(a, b) => compare(a, b, Ordering::is_lt)?,
        Predicate::LtEql(a, b) => compare(a, b, Ordering::is_le)?,
        Predicate::Gt(a, b) => compare(a, b, Ordering::is_gt)?,
        Predicate::GtEql(a, b) => compare(a, b, Ordering::is_ge)?,
        Predicate::Like {
            term,
            pattern,
            case_insensitive,
        } => {
            let regex = like_regex(pattern, *case_insensitive)?;
            any(&value(term)?, |v| v.as_str().is_some_and(|s| regex.is_match(s)))
        }
        Predicate::In(term, values) => any(&value(term)?, |v| values.iter().any(|candidate| candidate.loosely_equals(v))),
        Predicate::IsNull(term, expected) => value(term)?.is_empty() == *expected,
    })
}

/// True if `f` holds for the value, or for any element of a list value.
fn any(value: &Value, f: impl Fn(&Value) -> bool + Copy) -> bool {
    match value {
        Value::List(values) => values.iter().any(|v| any(v, f)),
        v => f(v),
    }
}

/// Translates a SQL `LIKE` pattern into an anchored regular expression.
pub(crate) fn like_regex(pattern: &str, case_insensitive: bool) -> CoreResult<Regex> {
    let mut re = String::from(if case_insensitive { "(?is)^" } else { "(?s)^" });

    for c in pattern.chars() {
        match c {
            '%' => re.push_str(".*"),
            '_' => re.push('.'),
            c => re.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }

    re.push('$');

    Regex::new(&re).map_err(|err| CoreError::interpreter(format!("Invalid pattern '{pattern}': {err}")))
}

pub(crate) fn term_value(mapping: &dyn Mapping, term: &Term, cursor: &dyn Cursor) -> CoreResult<Value> {
    match term {
        Term::Const(value) => Ok(value.clone()),
        Term::Path(path) => path_value(mapping, path, cursor),
    }
}

fn path_value(mapping: &dyn Mapping, path: &[String], cursor: &dyn Cursor) -> CoreResult<Value> {
    let Some((head, tail)) = path.split_first() else {
        return cursor.as_leaf();
    };

    let tpe = cursor.concrete_type_name()?;

    match mapping.resolve_field(cursor.path(), &tpe, head) {
        FieldResolution::Computed(f) if tail.is_empty() => f(cursor),
        FieldResolution::Computed(_) => Err(CoreError::interpreter(format!(
            "Computed field '{head}' of type '{tpe}' cannot be navigated"
        ))),
        FieldResolution::Delegated(_) => Err(CoreError::interpreter(format!(
            "Filtering on delegated field '{head}' of type '{tpe}' is not supported"
        ))),
        FieldResolution::Cursor => value_at(mapping, tail, cursor.field(head)?),
    }
}

fn value_at(mapping: &dyn Mapping, tail: &[String], cursor: CursorRef) -> CoreResult<Value> {
    if cursor.is_nullable() {
        return match cursor.as_nullable()? {
            Some(inner) => value_at(mapping, tail, inner),
            None => Ok(Value::Null),
        };
    }

    if cursor.is_list() {
        let values = cursor
            .as_list()?
            .into_iter()
            .map(|elem| value_at(mapping, tail, elem))
            .collect::<CoreResult<Vec<_>>>()?;

        return Ok(Value::List(values));
    }

    if tail.is_empty() && !cursor.is_leaf() {
        return Err(CoreError::interpreter(format!(
            "Filter path '{}' does not end at a leaf",
            cursor.path().join(".")
        )));
    }

    path_value(mapping, tail, cursor.as_ref())
}

/// Stable sort of the elements by the given selections.
pub(crate) fn order(
    mapping: &dyn Mapping,
    selections: &[OrderSelection],
    elems: Vec<CursorRef>,
) -> CoreResult<Vec<CursorRef>> {
    let mut keyed = elems
        .into_iter()
        .map(|elem| {
            let keys = selections
                .iter()
                .map(|s| term_value(mapping, &s.term, elem.as_ref()))
                .collect::<CoreResult<Vec<_>>>()?;

            Ok((keys, elem))
        })
        .collect::<CoreResult<Vec<_>>>()?;

    keyed.sort_by(|(a, _), (b, _)| {
        selections
            .iter()
            .zip(a.iter().zip(b.iter()))
            .map(|(selection, (a, b))| compare_keys(selection, a, b))
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
    });

    Ok(keyed.into_iter().map(|(_, elem)| elem).collect())
}

fn compare_keys(selection: &OrderSelection, a: &Value, b: &Value) -> Ordering {
    let nulls_first = selection.nulls_order == NullsOrder::First;

    match (a.is_empty(), b.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) if nulls_first => Ordering::Less,
        (true, false) => Ordering::Greater,
        (false, true) if nulls_first => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            let ord = a.compare(b).unwrap_or(Ordering::Equal);

            match selection.sort_order {
                SortOrder::Ascending => ord,
                SortOrder::Descending => ord.reverse(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_patterns_translate_to_anchored_regexes() {
        let re = like_regex("Linh%", false).unwrap();

        assert!(re.is_match("Linhe"));
        assert!(!re.is_match("linhe"));
        assert!(!re.is_match("ALinhe"));
        assert!(like_regex("linh_i", true).unwrap().is_match("LINHAI"));
        assert!(like_regex("a.b%", false).unwrap().is_match("a.bc"));
        assert!(!like_regex("a.b%", false).unwrap().is_match("axbc"));
    }
}
