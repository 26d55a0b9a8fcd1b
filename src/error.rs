use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("API error: Response Code: {status} | Response Reason: {reason}")]
    Api {
        status: u16,
        reason: String,
        error_code: Option<String>,
        error_summary: Option<String>,
    },
    #[error("required value not set: {0}")]
    Validation(String),
    #[error("command not found: {0}")]
    NotFound(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Multi-line rendering used for console output and audit events,
    /// matching the provider's error body fields.
    pub fn detail(&self) -> String {
        match self {
            Error::Api { status, reason, error_code, error_summary } => format!(
                "Response Code: {} | Response Reason: {}\n    Error Code: {} | Error Summary: {}",
                status,
                reason,
                error_code.as_deref().unwrap_or("unknown"),
                error_summary.as_deref().unwrap_or("unknown"),
            ),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
