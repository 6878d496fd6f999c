use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::builders::find_command;
use crate::clauses::QueryState;
use crate::config::ConnectionConfig;
use crate::error::{FmError, Result, NO_RECORDS_CODE};
use crate::traits::{NativeConnector, NativeError, NativeRecord, NativeSession, QueryBuilder};
use crate::types::{FieldData, FieldValue, InsertData, Record};

/// Driver backed by the in-process native connector.
///
/// A connector session is opened for every terminal call from the stored
/// configuration and dropped when the call returns.
pub struct NativeDriver {
    connector: Arc<dyn NativeConnector>,
    config: ConnectionConfig,
    layout: Option<String>,
    state: QueryState,
}

impl NativeDriver {
    pub fn new(connector: Arc<dyn NativeConnector>) -> Self {
        Self {
            connector,
            config: ConnectionConfig::default(),
            layout: None,
            state: QueryState::new(),
        }
    }

    /// Stores connection parameters; nothing is opened until a terminal call.
    pub fn set_connection(&mut self, config: ConnectionConfig) {
        self.config = config;
    }

    pub fn connection(&self) -> &ConnectionConfig {
        &self.config
    }

    async fn session(&self) -> Result<Box<dyn NativeSession>> {
        self.connector.open(&self.config).await.map_err(FmError::from)
    }

    async fn execute_query(&self) -> Result<Vec<NativeRecord>> {
        let layout = self.require_layout()?;
        let session = self.session().await?;
        let query = find_command::compile(&self.state);
        debug!(layout = %layout, compound = query.command.is_compound(), "native find");

        no_records_as_empty(session.find(&layout, &query).await)
    }
}

/// The "no records match" status is an empty result, not a failure.
fn no_records_as_empty(
    result: std::result::Result<Vec<NativeRecord>, NativeError>,
) -> Result<Vec<NativeRecord>> {
    match result {
        Ok(records) => Ok(records),
        Err(e) if e.code == NO_RECORDS_CODE => {
            debug!("native connector reported no matching records");
            Ok(Vec::new())
        }
        Err(e) => Err(e.into()),
    }
}

/// Normalizes native records. The field set is taken once from the first
/// record and applied to every row.
fn format_results(results: &[NativeRecord], only: Option<&str>) -> Vec<Record> {
    let Some(first) = results.first() else {
        return Vec::new();
    };
    let fields: Vec<String> = first
        .field_names()
        .into_iter()
        .filter(|name| only.map_or(true, |keep| keep == *name))
        .map(str::to_string)
        .collect();

    results
        .iter()
        .map(|result| {
            let mut record = Record::new().with_record_id(result.record_id.clone());
            for field in &fields {
                record.push(field.clone(), result.field(field).cloned().unwrap_or(FieldValue::Null));
            }
            record
        })
        .collect()
}

#[async_trait]
impl QueryBuilder for NativeDriver {
    fn layout_name(&self) -> Option<&str> {
        self.layout.as_deref()
    }

    fn set_layout(&mut self, layout: String) {
        self.layout = Some(layout);
    }

    fn state(&self) -> &QueryState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut QueryState {
        &mut self.state
    }

    async fn fetch(&mut self, only: Option<&str>) -> Result<Vec<Record>> {
        let results = self.execute_query().await?;
        Ok(format_results(&results, only))
    }

    async fn insert<D>(&mut self, data: D) -> Result<Vec<Record>>
    where
        D: Into<InsertData> + Send,
    {
        let layout = self.require_layout()?;
        let session = self.session().await?;
        let mut stored = Vec::new();
        for item in data.into().into_records() {
            stored.extend(no_records_as_empty(session.add(&layout, &item).await)?);
        }
        Ok(format_results(&stored, None))
    }

    async fn update(&mut self, data: &FieldData) -> Result<Vec<Record>> {
        let records = self.execute_query().await?;
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let layout = self.require_layout()?;
        let session = self.session().await?;
        let mut updated = Vec::with_capacity(records.len());
        for record in &records {
            updated.push(session.edit(&layout, &record.record_id, data).await?);
        }
        Ok(format_results(&updated, None))
    }

    async fn delete(&mut self) -> Result<bool> {
        let records = self.execute_query().await?;
        if records.is_empty() {
            return Ok(false);
        }

        let layout = self.require_layout()?;
        let session = self.session().await?;
        for record in &records {
            if let Err(e) = session.delete(&layout, &record.record_id).await {
                warn!(record_id = %record.record_id, code = e.code, "native delete failed: {}", e.message);
                return Ok(false);
            }
        }
        Ok(true)
    }

    async fn by_record_id(&mut self, record_id: &str) -> Result<Option<Record>> {
        let layout = self.require_layout()?;
        let session = self.session().await?;
        let record = match session.record(&layout, record_id).await {
            Ok(record) => record,
            Err(e) if e.code == NO_RECORDS_CODE => None,
            Err(e) => return Err(e.into()),
        };
        Ok(record.and_then(|r| format_results(&[r], None).into_iter().next()))
    }
}
