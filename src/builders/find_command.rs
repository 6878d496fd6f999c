//! Compiles accumulated query state into native find commands.

use crate::clauses::{QueryState, SortDirection};
use crate::types::FieldValue;

/// One field condition inside a find request. Native find values are text.
#[derive(Debug, Clone, PartialEq)]
pub struct FindCriterion {
    pub field: String,
    pub value: String,
}

impl FindCriterion {
    fn new(field: &str, value: &FieldValue) -> Self {
        Self {
            field: field.to_string(),
            value: value.to_find_string(),
        }
    }
}

/// A set of criteria combined with AND; `omit` removes its matches.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FindRequest {
    pub criteria: Vec<FindCriterion>,
    pub omit: bool,
}

/// A numbered member of a compound find. Numbering starts at 1.
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundRequest {
    pub index: usize,
    pub request: FindRequest,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FindCommand {
    /// One implicit request holding every criterion.
    Find(FindRequest),
    /// Numbered requests; matches are OR-ed, omit requests subtract.
    Compound(Vec<CompoundRequest>),
}

impl FindCommand {
    pub fn is_compound(&self) -> bool {
        matches!(self, FindCommand::Compound(_))
    }

    /// Requests in execution order.
    pub fn requests(&self) -> Vec<&FindRequest> {
        match self {
            FindCommand::Find(request) => vec![request],
            FindCommand::Compound(requests) => requests.iter().map(|c| &c.request).collect(),
        }
    }
}

/// Sort rule with its 1-based priority.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeSortRule {
    pub field: String,
    pub priority: usize,
    pub direction: SortDirection,
}

/// Result window: skip `skip` records, return at most `max` (all if None).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub skip: u64,
    pub max: Option<u64>,
}

/// Everything the native connector needs to run a find.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeQuery {
    pub command: FindCommand,
    pub range: Option<Range>,
    pub sort_rules: Vec<NativeSortRule>,
}

/// Compiles the state into a native find.
///
/// Without exclusions or inclusions every criterion lands in a single plain
/// request. Otherwise a compound find is built, numbered from 1:
/// global criteria as one request (only when there are no inclusions),
/// then one request per inclusion value AND-ed with the global criteria,
/// then one omit request per exclusion.
pub fn compile(state: &QueryState) -> NativeQuery {
    let command = if state.needs_compound() {
        let mut requests = Vec::new();
        let next = push_global_request(state, &mut requests, 1);
        let next = push_inclusion_requests(state, &mut requests, next);
        push_exclusion_requests(state, &mut requests, next);
        FindCommand::Compound(requests)
    } else {
        FindCommand::Find(global_request(state))
    };

    let range = state.has_range().then(|| Range {
        skip: state.skip.unwrap_or(0),
        max: state.take,
    });

    let sort_rules = state
        .sort_rules
        .iter()
        .enumerate()
        .map(|(i, rule)| NativeSortRule {
            field: rule.field.clone(),
            priority: i + 1,
            direction: rule.direction,
        })
        .collect();

    NativeQuery {
        command,
        range,
        sort_rules,
    }
}

fn global_request(state: &QueryState) -> FindRequest {
    FindRequest {
        criteria: state
            .criteria
            .iter()
            .map(|c| FindCriterion::new(&c.field, &c.encoded_value()))
            .collect(),
        omit: false,
    }
}

/// Each push returns the index the next request will take.
fn push_global_request(
    state: &QueryState,
    requests: &mut Vec<CompoundRequest>,
    index: usize,
) -> usize {
    // Inclusion requests carry the global criteria themselves.
    if state.criteria.is_empty() || !state.inclusions.is_empty() {
        return index;
    }
    requests.push(CompoundRequest {
        index,
        request: global_request(state),
    });
    index + 1
}

fn push_inclusion_requests(
    state: &QueryState,
    requests: &mut Vec<CompoundRequest>,
    mut index: usize,
) -> usize {
    for inclusion in &state.inclusions {
        for value in &inclusion.values {
            let mut request = global_request(state);
            request
                .criteria
                .insert(0, FindCriterion::new(&inclusion.field, value));
            requests.push(CompoundRequest { index, request });
            index += 1;
        }
    }
    index
}

fn push_exclusion_requests(
    state: &QueryState,
    requests: &mut Vec<CompoundRequest>,
    mut index: usize,
) -> usize {
    for exclusion in &state.exclusions {
        requests.push(CompoundRequest {
            index,
            request: FindRequest {
                criteria: vec![FindCriterion::new(
                    &exclusion.field,
                    &exclusion.encoded_value(),
                )],
                omit: true,
            },
        });
        index += 1;
    }
    index
}
