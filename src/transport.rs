//! The request/response boundary consumed by the fetcher and entity models.
//!
//! [`Transport`] performs exactly one HTTP request. [`NotebookClient`](crate::NotebookClient)
//! implements it over reqwest; tests implement it in memory.

use std::fmt;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{NotebookError, Result};

pub use reqwest::Method;

/// Where a request goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiPath {
    /// A path relative to the API base URL, used verbatim.
    Relative(String),
    /// A base path followed by segments that are percent-encoded individually.
    Segments { base: String, segments: Vec<String> },
    /// A fully formed URL, such as a `links.next` value.
    Absolute(String),
}

impl ApiPath {
    /// Build a `base/seg1/seg2` path with each segment encoded.
    pub fn segments<I, S>(base: impl Into<String>, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ApiPath::Segments {
            base: base.into(),
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether this path bypasses the base URL.
    pub fn is_absolute(&self) -> bool {
        matches!(self, ApiPath::Absolute(_))
    }

    /// Render to the string that gets joined onto the base URL.
    pub fn render(&self) -> String {
        match self {
            ApiPath::Relative(path) | ApiPath::Absolute(path) => path.clone(),
            ApiPath::Segments { base, segments } => {
                let mut out = base.trim_end_matches('/').to_string();
                for segment in segments {
                    out.push('/');
                    out.push_str(&urlencoding::encode(segment));
                }
                out
            }
        }
    }
}

impl fmt::Display for ApiPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<&str> for ApiPath {
    fn from(path: &str) -> Self {
        ApiPath::Relative(path.to_string())
    }
}

impl From<String> for ApiPath {
    fn from(path: String) -> Self {
        ApiPath::Relative(path)
    }
}

/// Request payload: either JSON or raw bytes with a content type.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(serde_json::Value),
    Data { content_type: String, bytes: Vec<u8> },
}

/// Description of a single API call.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: ApiPath,
    pub params: Vec<(String, String)>,
    pub body: Option<RequestBody>,
    pub headers: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<ApiPath>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Vec::new(),
            body: None,
            headers: Vec::new(),
        }
    }

    pub fn get(path: impl Into<ApiPath>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<ApiPath>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<ApiPath>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<ApiPath>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append one query parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    /// Append the fields of a serializable struct as query parameters.
    ///
    /// `None` fields are skipped and arrays are joined with commas, which is
    /// how the API expects list filters such as `includeTypes`.
    ///
    /// # Errors
    ///
    /// Returns [`NotebookError::InvalidQuery`] if `query` does not serialize
    /// to a flat object.
    pub fn with_query<Q: Serialize + ?Sized>(mut self, query: &Q) -> Result<Self> {
        let value = serde_json::to_value(query)?;
        let map = match value {
            serde_json::Value::Object(map) => map,
            serde_json::Value::Null => return Ok(self),
            other => {
                return Err(NotebookError::InvalidQuery(format!(
                    "expected an object, got {other}"
                )))
            }
        };

        for (key, value) in map {
            if let Some(rendered) = render_param(&key, value)? {
                self.params.push((key, rendered));
            }
        }
        Ok(self)
    }

    /// Attach a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if `body` fails to serialize.
    pub fn with_json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        self.body = Some(RequestBody::Json(serde_json::to_value(body)?));
        Ok(self)
    }

    /// Attach a binary body.
    #[must_use]
    pub fn with_data(mut self, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.body = Some(RequestBody::Data {
            content_type: content_type.into(),
            bytes,
        });
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Look up a query parameter by name.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

fn render_param(key: &str, value: serde_json::Value) -> Result<Option<String>> {
    use serde_json::Value;

    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Array(items) => {
            if items.is_empty() {
                return Ok(None);
            }
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                if let Some(part) = render_param(key, item)? {
                    parts.push(part);
                }
            }
            Ok(Some(parts.join(",")))
        }
        Value::Object(_) => Err(NotebookError::InvalidQuery(format!(
            "parameter '{key}' must be a scalar or a list"
        ))),
    }
}

/// A fully read HTTP response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    content: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, content: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            content,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A header value, if present and valid UTF-8.
    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Raw body bytes.
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn into_content(self) -> Vec<u8> {
        self.content
    }

    /// Decode the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`NotebookError::ParseError`] if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.content)?)
    }

    /// Turn a non-success status into [`NotebookError::ApiError`].
    pub fn error_for_status(self) -> Result<Self> {
        if self.status.is_success() {
            return Ok(self);
        }
        Err(NotebookError::from_response(
            self.status.as_u16(),
            &self.content,
        ))
    }
}

/// Performs a single request against the notebook API.
///
/// Implementations must return an error for non-success statuses
/// (see [`ApiResponse::error_for_status`]) and must not retry.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn call(&self, request: ApiRequest) -> Result<ApiResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[test]
    fn test_segments_are_encoded() {
        let path = ApiPath::segments("entities", ["journal:1/2", "children"]);
        assert_eq!(path.render(), "entities/journal%3A1%2F2/children");
    }

    #[test]
    fn test_relative_path_verbatim() {
        let path: ApiPath = "users/me".into();
        assert_eq!(path.to_string(), "users/me");
        assert!(!path.is_absolute());
    }

    #[derive(Serialize)]
    struct Filter {
        #[serde(rename = "includeTypes")]
        include_types: Vec<String>,
        #[serde(rename = "page[limit]")]
        limit: Option<u32>,
        q: Option<String>,
        enabled: bool,
    }

    #[test]
    fn test_with_query_flattens_fields() {
        let request = ApiRequest::get("entities")
            .with_query(&Filter {
                include_types: vec!["journal".into(), "experiment".into()],
                limit: Some(20),
                q: None,
                enabled: true,
            })
            .unwrap();

        assert_eq!(request.param("includeTypes"), Some("journal,experiment"));
        assert_eq!(request.param("page[limit]"), Some("20"));
        assert_eq!(request.param("enabled"), Some("true"));
        assert_eq!(request.param("q"), None);
    }

    #[test]
    fn test_with_query_rejects_non_object() {
        let err = ApiRequest::get("entities").with_query(&[1, 2]).unwrap_err();
        assert!(matches!(err, NotebookError::InvalidQuery(_)));
    }

    #[test]
    fn test_error_for_status() {
        let ok = ApiResponse::new(StatusCode::OK, HeaderMap::new(), b"{}".to_vec());
        assert!(ok.error_for_status().is_ok());

        let body = br#"{"errors":[{"status":"403","code":"forbidden"}]}"#.to_vec();
        let denied = ApiResponse::new(StatusCode::FORBIDDEN, HeaderMap::new(), body);
        let err = denied.error_for_status().unwrap_err();
        assert_eq!(err.api_code(), Some("forbidden"));
    }
}
