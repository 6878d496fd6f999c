use std::fmt;

use serde_json::{Number, Value};

/// A scalar field value in a backend-agnostic way.
/// Drivers are responsible for converting these to their wire format.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// True for null and for text that is empty once trimmed.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view of the value. Text is parsed, since the native
    /// connector hands every field back as text.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Int(i) => Some(*i as f64),
            FieldValue::Float(f) => Some(*f),
            FieldValue::Text(s) => s.trim().parse().ok(),
            FieldValue::Null | FieldValue::Bool(_) => None,
        }
    }

    /// Text form used for native find criteria and operator prefixes.
    /// Booleans follow FileMaker's 1/0 convention.
    pub fn to_find_string(&self) -> String {
        match self {
            FieldValue::Null => String::new(),
            FieldValue::Text(s) => s.clone(),
            FieldValue::Int(i) => i.to_string(),
            FieldValue::Float(f) => f.to_string(),
            FieldValue::Bool(true) => "1".to_string(),
            FieldValue::Bool(false) => "0".to_string(),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Int(i) => Value::Number((*i).into()),
            FieldValue::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
            FieldValue::Bool(b) => Value::Bool(*b),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&String> for FieldValue {
    fn from(value: &String) -> Self {
        FieldValue::Text(value.clone())
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Int(i64::from(value))
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Int(i64::from(value))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => FieldValue::Null,
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Int(i),
                None => FieldValue::Float(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => FieldValue::Text(s),
            // Containers are not scalar field content; keep their JSON text.
            other => FieldValue::Text(other.to_string()),
        }
    }
}

impl From<&FieldValue> for Value {
    fn from(value: &FieldValue) -> Self {
        value.to_json()
    }
}

/// Values accepted by `where_in`: a list, or a single scalar that is
/// treated as a one-element list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldValues(pub Vec<FieldValue>);

impl FieldValues {
    /// Empty lists and a lone null carry no constraint.
    pub fn is_empty(&self) -> bool {
        match self.0.as_slice() {
            [] => true,
            [only] => only.is_null(),
            _ => false,
        }
    }

    pub fn into_vec(self) -> Vec<FieldValue> {
        self.0
    }
}

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValues {
    fn from(values: Vec<T>) -> Self {
        FieldValues(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<FieldValue>, const N: usize> From<[T; N]> for FieldValues {
    fn from(values: [T; N]) -> Self {
        FieldValues(values.into_iter().map(Into::into).collect())
    }
}

impl From<FieldValue> for FieldValues {
    fn from(value: FieldValue) -> Self {
        FieldValues(vec![value])
    }
}

impl From<&str> for FieldValues {
    fn from(value: &str) -> Self {
        FieldValues(vec![value.into()])
    }
}

impl From<String> for FieldValues {
    fn from(value: String) -> Self {
        FieldValues(vec![value.into()])
    }
}

impl From<i64> for FieldValues {
    fn from(value: i64) -> Self {
        FieldValues(vec![value.into()])
    }
}

impl From<i32> for FieldValues {
    fn from(value: i32) -> Self {
        FieldValues(vec![value.into()])
    }
}

impl From<f64> for FieldValues {
    fn from(value: f64) -> Self {
        FieldValues(vec![value.into()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_blank_detection() {
        assert!(FieldValue::Null.is_blank());
        assert!(FieldValue::from("   ").is_blank());
        assert!(!FieldValue::from("x").is_blank());
        assert!(!FieldValue::from(0).is_blank());
        assert!(!FieldValue::from(false).is_blank());
    }

    #[test]
    fn test_numeric_view() {
        assert_eq!(FieldValue::from(5).as_f64(), Some(5.0));
        assert_eq!(FieldValue::from(" 2.5 ").as_f64(), Some(2.5));
        assert_eq!(FieldValue::from("abc").as_f64(), None);
        assert_eq!(FieldValue::Null.as_f64(), None);
    }

    #[test]
    fn test_find_string() {
        assert_eq!(FieldValue::from(true).to_find_string(), "1");
        assert_eq!(FieldValue::from(5.0).to_find_string(), "5");
        assert_eq!(FieldValue::Null.to_find_string(), "");
    }

    #[test]
    fn test_json_conversion() {
        assert_eq!(FieldValue::from(json!(5)), FieldValue::Int(5));
        assert_eq!(FieldValue::from(json!(1.5)), FieldValue::Float(1.5));
        assert_eq!(FieldValue::from(json!("A")), FieldValue::Text("A".into()));
        assert_eq!(FieldValue::from(json!(null)), FieldValue::Null);
        assert_eq!(FieldValue::from(json!([1])), FieldValue::Text("[1]".into()));
        assert_eq!(FieldValue::Int(5).to_json(), json!(5));
    }

    #[test]
    fn test_field_values_scalar_and_empty() {
        let scalar: FieldValues = "east".into();
        assert_eq!(scalar.0, vec![FieldValue::from("east")]);

        assert!(FieldValues::from(Vec::<i64>::new()).is_empty());
        assert!(FieldValues::from(FieldValue::Null).is_empty());
        assert!(!FieldValues::from(["east", "west"]).is_empty());
    }
}
