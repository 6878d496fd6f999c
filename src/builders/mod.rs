pub mod find_command;
pub mod find_query;

pub use find_command::{
    CompoundRequest, FindCommand, FindCriterion, FindRequest, NativeQuery, NativeSortRule, Range,
};
pub use find_query::{FindBody, RestQuery};
