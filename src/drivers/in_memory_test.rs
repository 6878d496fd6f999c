use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::builders::NativeQuery;
use crate::config::ConnectionConfig;
use crate::error::{FmError, Result};
use crate::traits::{
    HttpRequest, HttpResponse, HttpTransport, NativeConnector, NativeError, NativeRecord,
    NativeSession,
};
use crate::types::FieldData;

/// A find command recorded by the in-memory connector.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedFind {
    pub layout: String,
    pub query: NativeQuery,
}

#[derive(Default)]
struct ConnectorState {
    find_responses: VecDeque<std::result::Result<Vec<NativeRecord>, NativeError>>,
    delete_failures: VecDeque<NativeError>,
    records: Vec<(String, NativeRecord)>,
    next_id: u64,
    recorded_finds: Vec<RecordedFind>,
    sessions_opened: usize,
}

/// An in-memory native connector for testing.
///
/// Records every find command and every session opened. Queued find
/// responses are returned in FIFO order; once the queue is empty a find
/// returns every stored record of the layout (criteria are recorded, not
/// evaluated). `add`, `edit`, `delete` and `record` work on the store.
///
/// # Example
/// ```
/// use fmquery::drivers::InMemoryConnector;
/// use fmquery::traits::NativeRecord;
///
/// let connector = InMemoryConnector::new()
///     .with_record("Orders", NativeRecord::new("1").with_field("status", "open"));
/// assert_eq!(connector.stored_records("Orders").len(), 1);
/// ```
#[derive(Clone, Default)]
pub struct InMemoryConnector {
    state: Arc<Mutex<ConnectorState>>,
}

impl InMemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the records returned by the next find.
    pub fn with_find_response(self, records: Vec<NativeRecord>) -> Self {
        self.state
            .lock()
            .unwrap()
            .find_responses
            .push_back(Ok(records));
        self
    }

    /// Queue an error returned by the next find.
    pub fn with_find_error(self, code: i64, message: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .find_responses
            .push_back(Err(NativeError::new(code, message)));
        self
    }

    /// Make the next delete fail with the given error.
    pub fn with_delete_failure(self, code: i64, message: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .delete_failures
            .push_back(NativeError::new(code, message));
        self
    }

    /// Seed the store with a record.
    pub fn with_record(self, layout: &str, record: NativeRecord) -> Self {
        self.state
            .lock()
            .unwrap()
            .records
            .push((layout.to_string(), record));
        self
    }

    pub fn stored_records(&self, layout: &str) -> Vec<NativeRecord> {
        self.state
            .lock()
            .unwrap()
            .records
            .iter()
            .filter(|(l, _)| l == layout)
            .map(|(_, r)| r.clone())
            .collect()
    }

    pub fn recorded_finds(&self) -> Vec<RecordedFind> {
        self.state.lock().unwrap().recorded_finds.clone()
    }

    pub fn last_find(&self) -> Option<RecordedFind> {
        self.state.lock().unwrap().recorded_finds.last().cloned()
    }

    pub fn sessions_opened(&self) -> usize {
        self.state.lock().unwrap().sessions_opened
    }

    /// Assert that exactly n finds were executed.
    pub fn assert_find_count(&self, expected: usize) {
        let actual = self.state.lock().unwrap().recorded_finds.len();
        assert_eq!(
            actual, expected,
            "Find count mismatch. Expected: {}, Actual: {}",
            expected, actual
        );
    }
}

#[async_trait]
impl NativeConnector for InMemoryConnector {
    async fn open(&self, _config: &ConnectionConfig) -> std::result::Result<Box<dyn NativeSession>, NativeError> {
        self.state.lock().unwrap().sessions_opened += 1;
        Ok(Box::new(InMemorySession {
            state: Arc::clone(&self.state),
        }))
    }
}

struct InMemorySession {
    state: Arc<Mutex<ConnectorState>>,
}

#[async_trait]
impl NativeSession for InMemorySession {
    async fn find(
        &self,
        layout: &str,
        query: &NativeQuery,
    ) -> std::result::Result<Vec<NativeRecord>, NativeError> {
        let mut state = self.state.lock().unwrap();
        state.recorded_finds.push(RecordedFind {
            layout: layout.to_string(),
            query: query.clone(),
        });

        match state.find_responses.pop_front() {
            Some(response) => response,
            None => Ok(state
                .records
                .iter()
                .filter(|(l, _)| l == layout)
                .map(|(_, r)| r.clone())
                .collect()),
        }
    }

    async fn add(
        &self,
        layout: &str,
        data: &FieldData,
    ) -> std::result::Result<Vec<NativeRecord>, NativeError> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let mut record = NativeRecord::new(state.next_id.to_string());
        record.apply(data);
        state.records.push((layout.to_string(), record.clone()));
        Ok(vec![record])
    }

    async fn edit(
        &self,
        layout: &str,
        record_id: &str,
        data: &FieldData,
    ) -> std::result::Result<NativeRecord, NativeError> {
        let mut state = self.state.lock().unwrap();
        let (_, record) = state
            .records
            .iter_mut()
            .find(|(l, r)| l == layout && r.record_id == record_id)
            .ok_or_else(|| NativeError::new(101, "Record is missing"))?;
        record.apply(data);
        Ok(record.clone())
    }

    async fn delete(&self, layout: &str, record_id: &str) -> std::result::Result<(), NativeError> {
        let mut state = self.state.lock().unwrap();
        if let Some(failure) = state.delete_failures.pop_front() {
            return Err(failure);
        }
        let before = state.records.len();
        state
            .records
            .retain(|(l, r)| !(l == layout && r.record_id == record_id));
        if state.records.len() == before {
            return Err(NativeError::new(101, "Record is missing"));
        }
        Ok(())
    }

    async fn record(
        &self,
        layout: &str,
        record_id: &str,
    ) -> std::result::Result<Option<NativeRecord>, NativeError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .records
            .iter()
            .find(|(l, r)| l == layout && r.record_id == record_id)
            .map(|(_, r)| r.clone()))
    }
}

/// An in-memory Data API transport for testing.
///
/// Allows configuring responses and verifying sent requests. Responses are
/// returned in FIFO order; when none remain a transport error is returned.
pub struct InMemoryTransport {
    responses: Mutex<VecDeque<HttpResponse>>,
    recorded_requests: Mutex<Vec<HttpRequest>>,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            recorded_requests: Mutex::new(Vec::new()),
        }
    }

    /// Add a response to be returned by the next request.
    pub fn with_response(self, status: u16, body: Value) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(HttpResponse::new(status, body));
        self
    }

    /// Add multiple responses to be returned by subsequent requests.
    pub fn with_responses(self, responses: impl IntoIterator<Item = HttpResponse>) -> Self {
        let mut queue = self.responses.lock().unwrap();
        for response in responses {
            queue.push_back(response);
        }
        drop(queue);
        self
    }

    pub fn recorded_requests(&self) -> Vec<HttpRequest> {
        self.recorded_requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Option<HttpRequest> {
        self.recorded_requests.lock().unwrap().last().cloned()
    }

    /// Assert that exactly n requests were sent.
    pub fn assert_request_count(&self, expected: usize) {
        let actual = self.recorded_requests.lock().unwrap().len();
        assert_eq!(
            actual, expected,
            "Request count mismatch. Expected: {}, Actual: {}",
            expected, actual
        );
    }
}

impl Default for InMemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for InMemoryTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let description = format!("{} {}", request.method, request.path);
        self.recorded_requests.lock().unwrap().push(request);

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| FmError::connection(format!("No response queued for {}", description), 0))
    }
}
