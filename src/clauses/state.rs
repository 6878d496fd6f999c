use crate::clauses::{
    Criterion, ExclusionCriterion, InclusionSet, SortDirection, SortRule, EQUALITY_OPERATOR,
    NOT_EQUAL_OPERATOR,
};
use crate::types::{FieldValue, FieldValues};

/// Filter, sort and pagination state accumulated by fluent calls.
///
/// State is not reset by terminal calls; use `reorder()` or a fresh
/// builder between independent queries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryState {
    pub criteria: Vec<Criterion>,
    pub exclusions: Vec<ExclusionCriterion>,
    pub inclusions: Vec<InclusionSet>,
    pub sort_rules: Vec<SortRule>,
    pub take: Option<u64>,
    pub skip: Option<u64>,
    pub random_order: bool,
}

impl QueryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Equality condition.
    pub fn add_where(&mut self, field: impl Into<String>, value: FieldValue) {
        self.add_where_op(field, EQUALITY_OPERATOR, value);
    }

    /// Comparison condition. `!=` is stored as an exclusion.
    pub fn add_where_op(&mut self, field: impl Into<String>, operator: &str, value: FieldValue) {
        if operator.trim() == NOT_EQUAL_OPERATOR {
            self.add_where_not(field, value);
            return;
        }
        self.criteria
            .push(Criterion::new(field, Some(operator.to_string()), value));
    }

    pub fn add_where_not(&mut self, field: impl Into<String>, value: FieldValue) {
        self.exclusions.push(ExclusionCriterion {
            field: field.into(),
            value,
        });
    }

    /// Adds an inclusion set; empty values are ignored.
    pub fn add_where_in(&mut self, field: impl Into<String>, values: FieldValues) {
        if values.is_empty() {
            return;
        }
        self.inclusions.push(InclusionSet::new(field, values));
    }

    pub fn add_sort(&mut self, field: impl Into<String>, direction: SortDirection) {
        self.sort_rules.push(SortRule {
            field: field.into(),
            direction,
        });
    }

    /// Clears sort rules and the random flag, leaving filters in place.
    pub fn reorder(&mut self) {
        self.sort_rules.clear();
        self.random_order = false;
    }

    pub fn has_filters(&self) -> bool {
        !self.criteria.is_empty() || !self.exclusions.is_empty() || !self.inclusions.is_empty()
    }

    /// A compound request is needed once exclusions or inclusions exist.
    pub fn needs_compound(&self) -> bool {
        !self.exclusions.is_empty() || !self.inclusions.is_empty()
    }

    pub fn has_range(&self) -> bool {
        self.take.is_some() || self.skip.map_or(false, |skip| skip > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_equal_is_redirected() {
        let mut state = QueryState::new();
        state.add_where_op("status", "!=", "closed".into());
        state.add_where_op("qty", ">", 5.into());

        assert_eq!(state.exclusions.len(), 1);
        assert_eq!(state.exclusions[0].field, "status");
        assert_eq!(state.criteria.len(), 1);
        assert_eq!(state.criteria[0].operator.as_deref(), Some(">"));
    }

    #[test]
    fn test_two_argument_where_is_equality() {
        let mut state = QueryState::new();
        state.add_where("status", "active".into());
        assert_eq!(state.criteria[0].operator.as_deref(), Some(EQUALITY_OPERATOR));
        assert_eq!(state.criteria[0].encoded_value(), FieldValue::from("==active"));
    }

    #[test]
    fn test_empty_where_in_is_ignored() {
        let mut state = QueryState::new();
        state.add_where_in("region", Vec::<&str>::new().into());
        assert!(state.inclusions.is_empty());
        assert!(!state.needs_compound());

        state.add_where_in("region", "east".into());
        assert_eq!(state.inclusions[0].values, vec![FieldValue::from("east")]);
        assert!(state.needs_compound());
    }

    #[test]
    fn test_reorder_keeps_filters() {
        let mut state = QueryState::new();
        state.add_where("status", "active".into());
        state.add_sort("name", SortDirection::Descending);
        state.random_order = true;

        state.reorder();

        assert!(state.sort_rules.is_empty());
        assert!(!state.random_order);
        assert_eq!(state.criteria.len(), 1);
    }

    #[test]
    fn test_range_detection() {
        let mut state = QueryState::new();
        assert!(!state.has_range());
        state.skip = Some(0);
        assert!(!state.has_range());
        state.take = Some(10);
        assert!(state.has_range());
    }
}
