use serde_json::{Map, Value};

use crate::error::{FmError, Result};
use crate::types::FieldValue;

/// An ordered set of field assignments, used for inserts and updates.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldData {
    fields: Vec<(String, FieldValue)>,
}

impl FieldData {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Sets a field, replacing an earlier assignment to the same name.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        let field = field.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((field, value)),
        }
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The `fieldData` object sent to the Data API.
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .fields
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect();
        Value::Object(map)
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for FieldData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(FieldData::new(), |data, (k, v)| data.set(k, v))
    }
}

impl TryFrom<Value> for FieldData {
    type Error = FmError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(map.into_iter().collect()),
            other => Err(FmError::Serialization(format!(
                "expected an object of field values, got {}",
                other
            ))),
        }
    }
}

/// Input to `insert`: one record or a list of records.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertData {
    One(FieldData),
    Many(Vec<FieldData>),
}

impl InsertData {
    pub fn into_records(self) -> Vec<FieldData> {
        match self {
            InsertData::One(data) => vec![data],
            InsertData::Many(list) => list,
        }
    }
}

impl From<FieldData> for InsertData {
    fn from(data: FieldData) -> Self {
        InsertData::One(data)
    }
}

impl From<Vec<FieldData>> for InsertData {
    fn from(list: Vec<FieldData>) -> Self {
        InsertData::Many(list)
    }
}

impl TryFrom<Value> for InsertData {
    type Error = FmError;

    /// An array is a list of records; an object is a single record.
    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Array(items) => items
                .into_iter()
                .map(FieldData::try_from)
                .collect::<Result<Vec<_>>>()
                .map(InsertData::Many),
            other => FieldData::try_from(other).map(InsertData::One),
        }
    }
}

/// A normalized record returned to callers.
/// Fields keep the order the backend reported them in.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    record_id: Option<String>,
    fields: Vec<(String, FieldValue)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_record_id(mut self, record_id: impl Into<String>) -> Self {
        self.record_id = Some(record_id.into());
        self
    }

    pub(crate) fn push(&mut self, field: impl Into<String>, value: FieldValue) {
        self.fields.push((field.into(), value));
    }

    /// Backend-assigned identifier, used to address the record later.
    pub fn record_id(&self) -> Option<&str> {
        self.record_id.as_deref()
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    /// Field value, or `FieldValue::Null` when the field is absent.
    pub fn field(&self, field: &str) -> FieldValue {
        self.get(field).cloned().unwrap_or(FieldValue::Null)
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .fields
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect();
        Value::Object(map)
    }
}
