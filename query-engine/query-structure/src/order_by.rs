use crate::Term;

#[derive(Clone, Copy, PartialEq, Debug, Eq, Hash)]
pub enum SortOrder {
    Ascending,
    Descending,
}

#[derive(Clone, Copy, PartialEq, Debug, Eq, Hash)]
pub enum NullsOrder {
    First,
    Last,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderSelection {
    pub term: Term,
    pub sort_order: SortOrder,
    pub nulls_order: NullsOrder,
}

impl OrderSelection {
    pub fn asc(term: Term) -> Self {
        OrderSelection {
            term,
            sort_order: SortOrder::Ascending,
            nulls_order: NullsOrder::First,
        }
    }

    pub fn desc(term: Term) -> Self {
        OrderSelection {
            term,
            sort_order: SortOrder::Descending,
            nulls_order: NullsOrder::Last,
        }
    }
}
