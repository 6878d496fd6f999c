use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{FmError, Result};

/// Path prefix of the Data API on a FileMaker Server host.
const DATA_API_PATH: &str = "fmi/data/v2/databases";

/// Supported backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    /// In-process native connector.
    Native,
    /// Data API over HTTPS.
    Rest,
}

impl FromStr for DriverKind {
    type Err = FmError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" => Err(FmError::configuration("No connection driver set")),
            "fmphp" | "native" => Ok(DriverKind::Native),
            "fmrest" | "rest" | "data-api" | "dataapi" => Ok(DriverKind::Rest),
            _ => Err(FmError::configuration("Unknown connection driver")),
        }
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverKind::Native => write!(f, "native"),
            DriverKind::Rest => write!(f, "rest"),
        }
    }
}

fn default_verify_ssl() -> bool {
    true
}

/// Connection parameters. Storing them never opens a connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default)]
    pub driver: String,
    #[serde(default)]
    pub host: String,
    /// Database file name.
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_verify_ssl")]
    pub verify_ssl: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            driver: String::new(),
            host: String::new(),
            file: String::new(),
            user: String::new(),
            password: String::new(),
            verify_ssl: true,
        }
    }
}

impl ConnectionConfig {
    pub fn new(driver: impl Into<String>) -> Self {
        Self {
            driver: driver.into(),
            ..Self::default()
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = file.into();
        self
    }

    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = user.into();
        self.password = password.into();
        self
    }

    pub fn with_verify_ssl(mut self, verify: bool) -> Self {
        self.verify_ssl = verify;
        self
    }

    /// Loads a configuration mapping such as
    /// `{"driver": "fmrest", "host": "fm.example.com", "file": "Sales"}`.
    pub fn from_value(value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(FmError::configuration("Unable to load connection"));
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Overlays the keys present in `value` onto this configuration.
    pub fn merge(&self, value: Value) -> Result<Self> {
        let Value::Object(overrides) = value else {
            return Err(FmError::configuration("Unable to load connection"));
        };
        let Value::Object(mut base) = serde_json::to_value(self)? else {
            return Err(FmError::Serialization(
                "connection config did not serialize to an object".to_string(),
            ));
        };
        base.extend(overrides);
        Ok(serde_json::from_value(Value::Object(base))?)
    }

    pub fn driver_kind(&self) -> Result<DriverKind> {
        self.driver.parse()
    }

    /// Base URL of the Data API for this host and file.
    pub fn data_api_url(&self) -> String {
        format!("https://{}/{}/{}/", self.host, DATA_API_PATH, self.file)
    }
}
