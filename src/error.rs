//! Error types for the invocation layer.
//!
//! Callers of [`RelayClient::invoke`](crate::client::RelayClient::invoke) see
//! exactly one outcome: a canonical result, or one terminal error. Failures of
//! individual candidates are recorded against that model's health and folded
//! into [`LlmError::AllModelsFailed`] once every candidate has been tried.

use thiserror::Error;

/// Library error type.
#[derive(Debug, Error, Clone)]
pub enum LlmError {
    /// The caller supplied an invalid request shape (ambiguous tool choice,
    /// malformed schema, empty message list). Raised before any network
    /// attempt and never retried.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The registry has zero enabled models. Requires operator
    /// reconfiguration (supply at least one API key).
    #[error("No models are enabled; configure at least one API key")]
    NoModelAvailable,

    /// Every attempted candidate failed. Carries one entry per model tried.
    #[error("All models failed: {}", render_failures(.0))]
    AllModelsFailed(Vec<ModelFailure>),

    /// Provider returned a non-success status code.
    #[error("API error {code}: {message}")]
    ApiError {
        /// HTTP status code
        code: u16,
        /// Error message from the provider
        message: String,
        /// Parsed error body, when the provider sent JSON
        details: Option<serde_json::Value>,
    },

    /// Authentication with the provider failed (401/403).
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// Provider rejected the request due to rate limiting (429).
    #[error("Rate limit exceeded: {0}")]
    RateLimitError(String),

    /// The request did not complete within the candidate's timeout.
    #[error("Request timed out: {0}")]
    TimeoutError(String),

    /// The connection to the provider could not be established.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Transport-level failure not covered by a more specific variant.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// The provider response body could not be parsed.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Invariant violation inside the library.
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl LlmError {
    /// Create an API error without details
    pub fn api_error(code: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Create an API error with a parsed body
    pub fn api_error_with_details(
        code: u16,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self::ApiError {
            code,
            message: message.into(),
            details: Some(details),
        }
    }

    /// HTTP status code associated with this error, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::ApiError { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// One candidate's failure inside an [`LlmError::AllModelsFailed`] aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFailure {
    /// Name of the model that failed
    pub model: String,
    /// Rendered error message
    pub error: String,
}

impl ModelFailure {
    pub(crate) fn new(model: impl Into<String>, error: &LlmError) -> Self {
        Self {
            model: model.into(),
            error: error.to_string(),
        }
    }
}

impl std::fmt::Display for ModelFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.model, self.error)
    }
}

fn render_failures(failures: &[ModelFailure]) -> String {
    failures
        .iter()
        .map(ModelFailure::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Classify a non-success HTTP response into a library error.
///
/// The body is attached as JSON details when it parses, so provider error
/// documents survive into logs and aggregates.
pub(crate) fn classify_http_error(status: u16, body: &str) -> LlmError {
    let message = match serde_json::from_str::<serde_json::Value>(body) {
        Ok(json) => {
            let message = json
                .pointer("/error/message")
                .or_else(|| json.pointer("/message"))
                .and_then(|v| v.as_str())
                .unwrap_or(body)
                .to_string();
            return match status {
                401 | 403 => LlmError::AuthenticationError(message),
                429 => LlmError::RateLimitError(message),
                _ => LlmError::api_error_with_details(status, message, json),
            };
        }
        Err(_) => {
            if body.is_empty() {
                format!("HTTP {status}")
            } else {
                body.to_string()
            }
        }
    };

    match status {
        401 | 403 => LlmError::AuthenticationError(message),
        429 => LlmError::RateLimitError(message),
        _ => LlmError::api_error(status, message),
    }
}
