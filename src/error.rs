//! Error types for notebook API operations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One entry of the vendor's `{"errors": [...]}` response body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    /// HTTP status, as a string (e.g. `"404"`).
    #[serde(default)]
    pub status: Option<String>,
    /// Machine-readable error code (e.g. `"not_found"`).
    #[serde(default)]
    pub code: Option<String>,
    /// Short summary.
    #[serde(default)]
    pub title: Option<String>,
    /// Human-readable explanation.
    #[serde(default)]
    pub detail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ApiErrorDetail>,
}

/// Errors that can occur during notebook API operations.
#[derive(Debug, Error)]
pub enum NotebookError {
    /// Configuration is missing or incomplete.
    #[error("Notebook API configuration required: {0}")]
    ConfigMissing(String),

    /// Malformed identifier supplied by the caller.
    #[error("Invalid identifier '{0}'")]
    InvalidId(String),

    /// Query parameters could not be turned into a request.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// The API answered with a non-success status.
    #[error("Notebook API error: {message}")]
    ApiError {
        message: String,
        status_code: Option<u16>,
        errors: Vec<ApiErrorDetail>,
    },

    /// The response decoded, but violates the envelope contract.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Positional lookup past the end of a loaded collection.
    #[error("Index {index} out of range for collection of {len} items")]
    IndexOutOfRange { index: usize, len: usize },

    /// Keyed lookup for an identifier absent from a loaded collection.
    #[error("No item with key '{key}'")]
    KeyNotFound { key: String },

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("Failed to parse response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),
}

impl NotebookError {
    /// Build an [`NotebookError::ApiError`] from a failed response.
    ///
    /// The vendor error list is kept when the body parses; otherwise the
    /// raw body (or the status line) becomes the message.
    pub fn from_response(status_code: u16, body: &[u8]) -> Self {
        let errors = serde_json::from_slice::<ErrorBody>(body)
            .map(|b| b.errors)
            .unwrap_or_default();

        let message = match errors.first() {
            Some(first) => first
                .detail
                .clone()
                .or_else(|| first.title.clone())
                .or_else(|| first.code.clone())
                .unwrap_or_else(|| format!("HTTP {status_code}")),
            None if body.is_empty() => format!("HTTP {status_code}"),
            None => String::from_utf8_lossy(body).into_owned(),
        };

        NotebookError::ApiError {
            message,
            status_code: Some(status_code),
            errors,
        }
    }

    /// The `status` of the first vendor error, if this is an API error.
    pub fn api_status(&self) -> Option<&str> {
        self.first_api_error().and_then(|e| e.status.as_deref())
    }

    /// The `code` of the first vendor error, if this is an API error.
    pub fn api_code(&self) -> Option<&str> {
        self.first_api_error().and_then(|e| e.code.as_deref())
    }

    /// True for "item doesn't exist" lookup failures, as opposed to failed requests.
    pub fn is_lookup(&self) -> bool {
        matches!(
            self,
            NotebookError::IndexOutOfRange { .. } | NotebookError::KeyNotFound { .. }
        )
    }

    fn first_api_error(&self) -> Option<&ApiErrorDetail> {
        match self {
            NotebookError::ApiError { errors, .. } => errors.first(),
            _ => None,
        }
    }
}

/// Result type alias for notebook operations.
pub type Result<T> = core::result::Result<T, NotebookError>;
