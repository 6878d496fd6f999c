mod criterion;
mod state;

pub use criterion::{
    evaluate_empty_value, Criterion, ExclusionCriterion, InclusionSet, SortDirection, SortRule,
    EQUALITY_OPERATOR, MATCH_EMPTY, NOT_EQUAL_OPERATOR,
};
pub use state::QueryState;
