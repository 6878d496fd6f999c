use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::builders::{find_query, RestQuery};
use crate::clauses::QueryState;
use crate::config::ConnectionConfig;
use crate::error::{FmError, Result};
use crate::traits::{Auth, HttpRequest, HttpResponse, HttpTransport, Method, QueryBuilder};
use crate::types::{FieldData, FieldValue, InsertData, Record};

/// Data API status for an identifier that does not exist.
const RECORD_MISSING_CODE: i64 = 101;

/// Driver for the FileMaker Data API.
///
/// The session token is obtained on the first request and reused for the
/// lifetime of the driver; it is never refreshed.
pub struct RestDriver {
    transport: Arc<dyn HttpTransport>,
    config: ConnectionConfig,
    layout: Option<String>,
    state: QueryState,
    token: Option<String>,
}

impl RestDriver {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            config: ConnectionConfig::default(),
            layout: None,
            state: QueryState::new(),
            token: None,
        }
    }

    /// Stores connection parameters; nothing is sent until a terminal call.
    pub fn set_connection(&mut self, config: ConnectionConfig) {
        self.config = config;
    }

    pub fn connection(&self) -> &ConnectionConfig {
        &self.config
    }

    /// True once a session token has been cached.
    pub fn has_session(&self) -> bool {
        self.token.is_some()
    }

    /// Returns the cached token, signing in first if there is none.
    async fn session_token(&mut self) -> Result<String> {
        if let Some(token) = &self.token {
            return Ok(token.clone());
        }

        let request = HttpRequest::new(
            Method::Post,
            "sessions",
            Auth::Basic {
                user: self.config.user.clone(),
                password: self.config.password.clone(),
            },
        )
        .with_body(json!({}));
        let payload = into_payload(self.transport.send(request).await?)?;

        let token = payload["response"]["token"]
            .as_str()
            .ok_or_else(|| FmError::connection("Sign-in response did not include a token", 0))?
            .to_string();
        info!(host = %self.config.host, file = %self.config.file, "signed in to Data API");

        self.token = Some(token.clone());
        Ok(token)
    }

    async fn send(&mut self, request: impl FnOnce(Auth) -> HttpRequest) -> Result<Value> {
        let token = self.session_token().await?;
        let request = request(Auth::Bearer(token));
        debug!(method = %request.method, path = %request.path, "Data API request");
        into_payload(self.transport.send(request).await?)
    }

    /// Raw `response.data` entries matching the current query.
    async fn execute_query(&mut self) -> Result<Vec<Value>> {
        let layout = self.require_layout()?;
        let compiled = find_query::compile(&self.state)?;

        let result = match compiled {
            RestQuery::List { limit } => {
                let path = endpoint(&["layouts", layout.as_str(), "records"]);
                self.send(|auth| {
                    let request = HttpRequest::new(Method::Get, path, auth);
                    match limit {
                        Some(limit) => request.with_query("_limit", limit.to_string()),
                        None => request,
                    }
                })
                .await
            }
            RestQuery::Find(body) => {
                let path = endpoint(&["layouts", layout.as_str(), "_find"]);
                let body = serde_json::to_value(body)?;
                self.send(|auth| HttpRequest::new(Method::Post, path, auth).with_body(body))
                    .await
            }
        };

        match result {
            Ok(payload) => Ok(response_data(payload)),
            Err(e) if e.is_no_records() => {
                debug!(layout = %layout, "Data API reported no matching records");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    async fn record_by_id(&mut self, layout: &str, record_id: &str) -> Result<Value> {
        let path = endpoint(&["layouts", layout, "records", record_id]);
        let payload = self
            .send(|auth| HttpRequest::new(Method::Get, path, auth))
            .await?;
        response_data(payload).into_iter().next().ok_or_else(|| {
            FmError::connection(format!("Record {} missing from response", record_id), 0)
        })
    }
}

/// Turns a non-2xx response into a connection error carrying the Data API
/// message code.
fn into_payload(response: HttpResponse) -> Result<Value> {
    if response.is_success() {
        return Ok(response.body);
    }

    let message = &response.body["messages"][0];
    let code = match &message["code"] {
        Value::String(code) => code.parse().unwrap_or(i64::from(response.status)),
        Value::Number(code) => code.as_i64().unwrap_or(i64::from(response.status)),
        _ => i64::from(response.status),
    };
    let text = message["message"]
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", response.status));
    Err(FmError::connection(text, code))
}

/// Request path relative to the database URL. Layout names may contain
/// spaces, `#`, `?` or `/`, so every segment is percent-encoded.
fn endpoint(segments: &[&str]) -> String {
    segments
        .iter()
        .map(|segment| urlencoding::encode(segment))
        .collect::<Vec<_>>()
        .join("/")
}

fn response_data(mut payload: Value) -> Vec<Value> {
    match payload
        .get_mut("response")
        .and_then(|response| response.get_mut("data"))
        .map(Value::take)
    {
        Some(Value::Array(data)) => data,
        _ => Vec::new(),
    }
}

fn record_id_of(value: &Value) -> Option<String> {
    match value {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

fn require_record_id(raw: &Value) -> Result<String> {
    record_id_of(&raw["recordId"])
        .ok_or_else(|| FmError::connection("Record without recordId in response", 0))
}

/// Normalizes Data API records. Each record contributes its own field set.
fn format_results(results: &[Value], only: Option<&str>) -> Vec<Record> {
    results
        .iter()
        .map(|result| {
            let mut record = match record_id_of(&result["recordId"]) {
                Some(id) => Record::new().with_record_id(id),
                None => Record::new(),
            };
            if let Some(fields) = result["fieldData"].as_object() {
                for (name, value) in fields {
                    if only.map_or(true, |keep| keep == name.as_str()) {
                        record.push(name.clone(), FieldValue::from(value.clone()));
                    }
                }
            }
            record
        })
        .collect()
}

#[async_trait]
impl QueryBuilder for RestDriver {
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
        let mut stored = Vec::new();
        for item in data.into().into_records() {
            let path = endpoint(&["layouts", layout.as_str(), "records"]);
            let body = json!({ "fieldData": item.to_json() });
            let payload = self
                .send(|auth| HttpRequest::new(Method::Post, path, auth).with_body(body))
                .await?;

            // Creation only answers with the identifier; fetch the stored record.
            let record_id = record_id_of(&payload["response"]["recordId"])
                .ok_or_else(|| FmError::connection("Create response did not include a recordId", 0))?;
            stored.push(self.record_by_id(&layout, &record_id).await?);
        }
        Ok(format_results(&stored, None))
    }

    async fn update(&mut self, data: &FieldData) -> Result<Vec<Record>> {
        let records = self.execute_query().await?;
        let layout = self.require_layout()?;

        let mut updated = Vec::with_capacity(records.len());
        for record in &records {
            let record_id = require_record_id(record)?;
            let path = endpoint(&["layouts", layout.as_str(), "records", record_id.as_str()]);
            let body = json!({ "fieldData": data.to_json() });
            self.send(|auth| HttpRequest::new(Method::Patch, path, auth).with_body(body))
                .await?;
            updated.push(self.record_by_id(&layout, &record_id).await?);
        }
        Ok(format_results(&updated, None))
    }

    async fn delete(&mut self) -> Result<bool> {
        let records = self.execute_query().await?;
        if records.is_empty() {
            return Ok(false);
        }
        let layout = self.require_layout()?;

        for record in &records {
            let record_id = require_record_id(record)?;
            let path = endpoint(&["layouts", layout.as_str(), "records", record_id.as_str()]);
            if let Err(e) = self
                .send(|auth| HttpRequest::new(Method::Delete, path, auth))
                .await
            {
                warn!(record_id = %record_id, "Data API delete failed: {}", e);
                return Ok(false);
            }
        }
        Ok(true)
    }

    async fn by_record_id(&mut self, record_id: &str) -> Result<Option<Record>> {
        let layout = self.require_layout()?;
        match self.record_by_id(&layout, record_id).await {
            Ok(raw) => Ok(format_results(&[raw], None).into_iter().next()),
            Err(FmError::Connection { code, .. }) if code == RECORD_MISSING_CODE => Ok(None),
            Err(e) if e.is_no_records() => Ok(None),
            Err(e) => Err(e),
        }
    }
}
