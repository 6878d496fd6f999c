use crate::types::{FieldValue, FieldValues};

/// Operator recorded by the two-argument `where_` form.
/// FileMaker reads `==` as "field content matches exactly".
pub const EQUALITY_OPERATOR: &str = "==";

/// Operator that `where_op` redirects into the exclusion list.
pub const NOT_EQUAL_OPERATOR: &str = "!=";

/// Find value that matches empty fields.
pub const MATCH_EMPTY: &str = "=";

/// A condition on one field. The operator, when present, is sent as a
/// prefix of the value (`">5"`, `"==Smith"`).
#[derive(Debug, Clone, PartialEq)]
pub struct Criterion {
    pub field: String,
    pub operator: Option<String>,
    pub value: FieldValue,
}

impl Criterion {
    pub fn new(field: impl Into<String>, operator: Option<String>, value: FieldValue) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }

    /// The value as it goes on the wire.
    pub fn encoded_value(&self) -> FieldValue {
        evaluate_empty_value(self.operator.as_deref(), &self.value)
    }
}

/// A negated condition, compiled into an omit request.
#[derive(Debug, Clone, PartialEq)]
pub struct ExclusionCriterion {
    pub field: String,
    pub value: FieldValue,
}

impl ExclusionCriterion {
    pub fn encoded_value(&self) -> FieldValue {
        evaluate_empty_value(None, &self.value)
    }
}

/// One field matched against any of several values.
#[derive(Debug, Clone, PartialEq)]
pub struct InclusionSet {
    pub field: String,
    pub values: Vec<FieldValue>,
}

impl InclusionSet {
    pub fn new(field: impl Into<String>, values: FieldValues) -> Self {
        Self {
            field: field.into(),
            values: values.into_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    /// Anything other than `desc`/`descend`/`descending` sorts ascending.
    pub fn parse(direction: &str) -> Self {
        match direction.trim().to_lowercase().as_str() {
            "desc" | "descend" | "descending" => SortDirection::Descending,
            _ => SortDirection::Ascending,
        }
    }
}

impl From<&str> for SortDirection {
    fn from(direction: &str) -> Self {
        SortDirection::parse(direction)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortRule {
    pub field: String,
    pub direction: SortDirection,
}

/// Encodes a criterion value for a find request.
///
/// Blank values (null, or text that trims to nothing) become `"="`, which
/// matches empty fields. Otherwise an operator is prefixed onto the value's
/// text, and a value without an operator is passed through untouched.
pub fn evaluate_empty_value(operator: Option<&str>, value: &FieldValue) -> FieldValue {
    if value.is_blank() {
        return FieldValue::from(MATCH_EMPTY);
    }
    match operator {
        Some(op) => FieldValue::Text(format!("{}{}", op, value.to_find_string())),
        None => value.clone(),
    }
}
