use async_trait::async_trait;

use crate::builders::NativeQuery;
use crate::config::ConnectionConfig;
use crate::error::FmError;
use crate::types::{FieldData, FieldValue};

/// Failure reported by the native connector, carrying its status code.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeError {
    pub code: i64,
    pub message: String,
}

impl NativeError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<NativeError> for FmError {
    fn from(e: NativeError) -> Self {
        FmError::Connection {
            message: e.message,
            code: e.code,
        }
    }
}

/// A record as the native connector returns it.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeRecord {
    pub record_id: String,
    pub fields: Vec<(String, FieldValue)>,
}

impl NativeRecord {
    pub fn new(record_id: impl Into<String>) -> Self {
        Self {
            record_id: record_id.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.push((field.into(), value.into()));
        self
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn field(&self, field: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    /// Applies field assignments, appending fields the record lacked.
    pub fn apply(&mut self, data: &FieldData) {
        for (name, value) in data.iter() {
            match self.fields.iter_mut().find(|(field, _)| field == name) {
                Some(slot) => slot.1 = value.clone(),
                None => self.fields.push((name.to_string(), value.clone())),
            }
        }
    }
}

/// Entry point to the native connector library.
/// A session is opened for every terminal call; nothing is pooled.
#[async_trait]
pub trait NativeConnector: Send + Sync {
    async fn open(&self, config: &ConnectionConfig) -> Result<Box<dyn NativeSession>, NativeError>;
}

/// Commands available on an open native session.
#[async_trait]
pub trait NativeSession: Send + Sync {
    /// Runs a plain or compound find.
    async fn find(&self, layout: &str, query: &NativeQuery)
        -> Result<Vec<NativeRecord>, NativeError>;

    /// Creates a record and returns what the server stored.
    async fn add(&self, layout: &str, data: &FieldData) -> Result<Vec<NativeRecord>, NativeError>;

    /// Sets fields on an existing record and commits it.
    async fn edit(
        &self,
        layout: &str,
        record_id: &str,
        data: &FieldData,
    ) -> Result<NativeRecord, NativeError>;

    async fn delete(&self, layout: &str, record_id: &str) -> Result<(), NativeError>;

    /// Fetches one record by identifier.
    async fn record(&self, layout: &str, record_id: &str)
        -> Result<Option<NativeRecord>, NativeError>;
}
