use reqwest::StatusCode;
use yoviajo_core::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Rejected ({status}): {detail}")]
    Rejected { status: u16, detail: String },
    #[error("Session expired or invalid")]
    Unauthorized,
    #[error("Server error ({status})")]
    Server { status: u16 },
    #[error("Unexpected response body: {0}")]
    Decode(String),
    #[error("Session storage error: {0}")]
    Storage(String),
    #[error("Not logged in")]
    NotAuthenticated,
    #[error("Invalid input: {0}")]
    Invalid(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// Map a non-success status and its body to an error.
    ///
    /// 4xx bodies carry a `detail` field that is shown to the user as-is;
    /// 5xx bodies are never shown.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        if status == StatusCode::UNAUTHORIZED {
            return ClientError::Unauthorized;
        }
        if status.is_server_error() {
            tracing::error!("Backend failure {}: {}", status, body);
            return ClientError::Server { status: status.as_u16() };
        }

        Self::rejected(status, body)
    }

    /// A 4xx carrying the server's `detail`, or the status reason when absent.
    pub fn rejected(status: StatusCode, body: &str) -> Self {
        let detail = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("detail").cloned())
            .map(|d| match d {
                serde_json::Value::String(s) => s,
                // Validation errors come back as a list of objects.
                other => other.to_string(),
            })
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request rejected").to_string());

        ClientError::Rejected { status: status.as_u16(), detail }
    }

    /// The blocking notice text for this failure.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Network(_) => "Could not reach the server. Check your connection.".to_string(),
            ClientError::Rejected { detail, .. } => detail.clone(),
            ClientError::Unauthorized => "Your session expired. Please log in again.".to_string(),
            ClientError::Server { .. } => "The server had a problem. Try again later.".to_string(),
            ClientError::Decode(_) => "The server sent an unexpected response.".to_string(),
            ClientError::Storage(_) => "Could not save your session locally.".to_string(),
            ClientError::NotAuthenticated => "You need to log in first.".to_string(),
            ClientError::Invalid(msg) => msg.clone(),
            ClientError::Config(msg) => format!("Configuration problem: {}", msg),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

impl From<CoreError> for ClientError {
    fn from(err: CoreError) -> Self {
        ClientError::Invalid(err.to_string())
    }
}

impl From<config::ConfigError> for ClientError {
    fn from(err: config::ConfigError) -> Self {
        ClientError::Config(err.to_string())
    }
}
