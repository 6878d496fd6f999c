use thiserror::Error;

/// FileMaker status code for "no records match the request".
pub const NO_RECORDS_CODE: i64 = 401;

/// Error type for fmquery operations
#[derive(Debug, Error)]
pub enum FmError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Field '{0}' not found")]
    FieldNotFound(String),

    #[error("Connection error ({code}): {message}")]
    Connection { message: String, code: i64 },

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl FmError {
    pub fn configuration(message: impl Into<String>) -> Self {
        FmError::Configuration(message.into())
    }

    pub fn connection(message: impl Into<String>, code: i64) -> Self {
        FmError::Connection {
            message: message.into(),
            code,
        }
    }

    /// True for errors raised before any backend call was made.
    pub fn is_configuration(&self) -> bool {
        matches!(self, FmError::Configuration(_) | FmError::FieldNotFound(_))
    }

    /// True when the backend reported that nothing matched the request.
    pub fn is_no_records(&self) -> bool {
        matches!(self, FmError::Connection { code, .. } if *code == NO_RECORDS_CODE)
    }
}

impl From<reqwest::Error> for FmError {
    fn from(e: reqwest::Error) -> Self {
        let code = e.status().map(|s| i64::from(s.as_u16())).unwrap_or(0);
        FmError::Connection {
            message: e.to_string(),
            code,
        }
    }
}

impl From<serde_json::Error> for FmError {
    fn from(e: serde_json::Error) -> Self {
        FmError::Serialization(e.to_string())
    }
}

/// Result type alias for fmquery operations
pub type Result<T> = std::result::Result<T, FmError>;
