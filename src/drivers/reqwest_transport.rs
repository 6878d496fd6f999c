use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use serde_json::Value;

use crate::config::ConnectionConfig;
use crate::error::{FmError, Result};
use crate::traits::{Auth, HttpRequest, HttpResponse, HttpTransport, Method};

/// Data API transport using reqwest.
pub struct ReqwestTransport {
    client: Client,
    base_url: Url,
}

impl ReqwestTransport {
    /// Builds a client for `https://{host}/fmi/data/v2/databases/{file}/`.
    /// Certificate verification follows `verify_ssl`.
    pub fn new(config: &ConnectionConfig) -> Result<Self> {
        let base_url = Url::parse(&config.data_api_url())
            .map_err(|e| FmError::configuration(format!("Invalid Data API URL: {}", e)))?;
        Self::with_base_url(base_url, config.verify_ssl)
    }

    /// Uses an explicit database URL, e.g. behind a gateway that rewrites
    /// the Data API path. The URL must end with `/`.
    pub fn with_base_url(base_url: Url, verify_ssl: bool) -> Result<Self> {
        if !base_url.path().ends_with('/') {
            return Err(FmError::configuration(format!(
                "Data API URL must end with '/': {}",
                base_url
            )));
        }
        let client = Client::builder()
            .danger_accept_invalid_certs(!verify_ssl)
            .build()?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = self
            .base_url
            .join(&request.path)
            .map_err(|e| FmError::configuration(format!("Invalid request path: {}", e)))?;

        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self
            .client
            .request(method, url)
            .header(CONTENT_TYPE, "application/json");
        builder = match &request.auth {
            Auth::Basic { user, password } => builder.basic_auth(user, Some(password)),
            Auth::Bearer(token) => builder.bearer_auth(token),
        };
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        Ok(HttpResponse::new(status, decode_body(status, &text)?))
    }
}

/// Parses a response body as JSON. Error pages from proxies are often HTML
/// or plain text; those decode to null so the status code is kept.
fn decode_body(status: u16, text: &str) -> Result<Value> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    match serde_json::from_str(text) {
        Ok(body) => Ok(body),
        Err(_) if !(200..300).contains(&status) => Ok(Value::Null),
        Err(e) => Err(FmError::connection(
            format!("Malformed Data API response: {}", e),
            i64::from(status),
        )),
    }
}
