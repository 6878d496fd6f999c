//! Compiles accumulated query state into Data API requests.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::clauses::QueryState;
use crate::error::{FmError, Result};

/// Marker value the Data API expects on omit requests.
const OMIT_MARKER: &str = "true";

/// Body of `POST layouts/{layout}/_find`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FindBody {
    pub query: Vec<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RestQuery {
    /// `GET layouts/{layout}/records`, optionally limited.
    List { limit: Option<u64> },
    /// `POST layouts/{layout}/_find`.
    Find(FindBody),
}

/// Compiles the state into a Data API request.
///
/// With no filters at all a plain record listing is issued. Otherwise the
/// find query holds: one object with every criterion (only when there are no
/// inclusions), one object per inclusion value AND-ed with the global
/// criteria, then one omit object per exclusion.
///
/// Offsets and sort rules are rejected until the Data API mapping for them
/// is settled.
pub fn compile(state: &QueryState) -> Result<RestQuery> {
    if state.skip.map_or(false, |skip| skip > 0) {
        return Err(FmError::Unsupported(
            "skip/offset is not supported by the Data API driver".to_string(),
        ));
    }
    if !state.sort_rules.is_empty() {
        return Err(FmError::Unsupported(
            "orderBy is not supported by the Data API driver".to_string(),
        ));
    }

    if !state.has_filters() {
        return Ok(RestQuery::List {
            limit: rest_limit(state),
        });
    }

    let mut query = Vec::new();
    push_criteria(state, &mut query);
    push_inclusions(state, &mut query);
    push_exclusions(state, &mut query);

    Ok(RestQuery::Find(FindBody {
        query,
        limit: rest_limit(state),
    }))
}

/// The Data API rejects a zero limit, so `take(0)` sends none.
fn rest_limit(state: &QueryState) -> Option<u64> {
    state.take.filter(|&take| take > 0)
}

fn global_criteria(state: &QueryState) -> Map<String, Value> {
    state
        .criteria
        .iter()
        .map(|c| (c.field.clone(), c.encoded_value().to_json()))
        .collect()
}

fn push_criteria(state: &QueryState, query: &mut Vec<Map<String, Value>>) {
    if state.criteria.is_empty() || !state.inclusions.is_empty() {
        return;
    }
    query.push(global_criteria(state));
}

fn push_inclusions(state: &QueryState, query: &mut Vec<Map<String, Value>>) {
    for inclusion in &state.inclusions {
        for value in &inclusion.values {
            let mut object = Map::new();
            object.insert(inclusion.field.clone(), value.to_json());
            // A global criterion on the same field overrides the inclusion value.
            object.extend(global_criteria(state));
            query.push(object);
        }
    }
}

fn push_exclusions(state: &QueryState, query: &mut Vec<Map<String, Value>>) {
    for exclusion in &state.exclusions {
        let mut object = Map::new();
        object.insert(exclusion.field.clone(), exclusion.encoded_value().to_json());
        object.insert("omit".to_string(), Value::String(OMIT_MARKER.to_string()));
        query.push(object);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clauses::SortDirection;
    use serde_json::json;

    fn body(state: &QueryState) -> Value {
        match compile(state).unwrap() {
            RestQuery::Find(body) => serde_json::to_value(body).unwrap(),
            other => panic!("Expected find query, got {:?}", other),
        }
    }

    #[test]
    fn test_no_filters_lists_records() {
        let mut state = QueryState::new();
        assert_eq!(compile(&state).unwrap(), RestQuery::List { limit: None });

        state.take = Some(5);
        assert_eq!(compile(&state).unwrap(), RestQuery::List { limit: Some(5) });
    }

    #[test]
    fn test_zero_take_sends_no_limit() {
        let mut state = QueryState::new();
        state.take = Some(0);
        assert_eq!(compile(&state).unwrap(), RestQuery::List { limit: None });

        state.add_where("status", "active".into());
        assert_eq!(body(&state), json!({"query": [{"status": "==active"}]}));
    }

    #[test]
    fn test_criteria_in_one_object() {
        let mut state = QueryState::new();
        state.add_where("status", "active".into());
        state.add_where_op("qty", ">", 5.into());
        state.add_where_op("notes", "==", "".into());

        assert_eq!(
            body(&state),
            json!({"query": [{"status": "==active", "qty": ">5", "notes": "="}]})
        );
    }

    #[test]
    fn test_inclusions_and_exclusions() {
        let mut state = QueryState::new();
        state.add_where("status", "active".into());
        state.add_where_in("region", ["east", "west"].into());
        state.add_where_not("archived", true.into());
        state.take = Some(50);

        assert_eq!(
            body(&state),
            json!({
                "query": [
                    {"region": "east", "status": "==active"},
                    {"region": "west", "status": "==active"},
                    {"archived": true, "omit": "true"},
                ],
                "limit": 50,
            })
        );
    }

    #[test]
    fn test_only_exclusions() {
        let mut state = QueryState::new();
        state.add_where_not("status", "closed".into());

        assert_eq!(
            body(&state),
            json!({"query": [{"status": "closed", "omit": "true"}]})
        );
    }

    #[test]
    fn test_offset_is_unsupported() {
        let mut state = QueryState::new();
        state.skip = Some(10);
        assert!(matches!(compile(&state), Err(FmError::Unsupported(_))));

        state.skip = Some(0);
        assert!(compile(&state).is_ok());
    }

    #[test]
    fn test_sort_is_unsupported() {
        let mut state = QueryState::new();
        state.add_where("status", "active".into());
        state.add_sort("name", SortDirection::Ascending);
        assert!(matches!(compile(&state), Err(FmError::Unsupported(_))));

        state.reorder();
        assert!(compile(&state).is_ok());
    }
}
