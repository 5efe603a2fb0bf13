//! Notebook API client.
//!
//! Low-level HTTP client that handles authentication and raw requests.
//! Higher-level operations are implemented via traits on entity types,
//! which talk to the client through the [`Transport`] trait.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::error::{NotebookError, Result};
use crate::transport::{ApiPath, ApiRequest, ApiResponse, RequestBody, Transport};

const API_KEY_HEADER: &str = "x-api-key";
const USER_AGENT: &str = concat!("notebookapi/", env!("CARGO_PKG_VERSION"));

/// Low-level notebook API client.
///
/// Handles authentication and HTTP requests. Entity-specific operations
/// are implemented via the `Get`, `List`, `Create`, `Update` and `Delete`
/// traits on model types, each taking the client as a `&dyn Transport`.
///
/// This struct is cheaply cloneable; clones reference the same underlying
/// connection pool.
///
/// # Example
///
/// ```no_run
/// use notebookapi::NotebookClient;
///
/// # fn example() -> notebookapi::Result<()> {
/// // Create from environment variables
/// let client = NotebookClient::from_env()?;
///
/// // Or configure manually
/// let client = NotebookClient::new("your-api-key", "https://tenant.example.com/api/rest/v1.0")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct NotebookClient {
    http: Client,
    base_url: Arc<Url>,
    api_key: String,
}

impl std::fmt::Debug for NotebookClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotebookClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl NotebookClient {
    /// Create a client from environment variables.
    ///
    /// Uses `NOTEBOOK_API_KEY` for authentication and `NOTEBOOK_API_URL`
    /// for the tenant's base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if either variable is not set.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("NOTEBOOK_API_KEY").map_err(|_| {
            NotebookError::ConfigMissing("NOTEBOOK_API_KEY environment variable not set".to_string())
        })?;

        let base_url = env::var("NOTEBOOK_API_URL").map_err(|_| {
            NotebookError::ConfigMissing("NOTEBOOK_API_URL environment variable not set".to_string())
        })?;

        Self::new(&api_key, &base_url)
    }

    /// Create a new client with the provided API key and base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid.
    pub fn new(api_key: &str, base_url: &str) -> Result<Self> {
        // Ensure base URL ends with /
        let base_url_str = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };

        let base_url = Url::parse(&base_url_str)?;

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .brotli(true)
            .gzip(true)
            .deflate(true)
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(NotebookError::HttpError)?;

        Ok(Self {
            http,
            base_url: Arc::new(base_url),
            api_key: api_key.to_string(),
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a request path against the base URL.
    ///
    /// Absolute paths (pagination links) are used as-is; if the server hands
    /// back a relative link it is resolved against the base URL instead.
    pub fn resolve(&self, path: &ApiPath) -> Result<Url> {
        let rendered = path.render();
        if path.is_absolute() {
            if let Ok(url) = Url::parse(&rendered) {
                return Ok(url);
            }
        }
        Ok(self.base_url.join(rendered.trim_start_matches('/'))?)
    }

    /// Send a request and read the whole response.
    #[tracing::instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let url = self.resolve(&request.path)?;

        let mut builder = self
            .http
            .request(request.method, url)
            .header(API_KEY_HEADER, &self.api_key);

        if !request.params.is_empty() {
            builder = builder.query(&request.params);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match request.body {
            Some(RequestBody::Json(body)) => builder.json(&body),
            Some(RequestBody::Data {
                content_type,
                bytes,
            }) => builder.header(reqwest::header::CONTENT_TYPE, content_type).body(bytes),
            None => builder,
        };

        let response = builder.send().await.map_err(NotebookError::HttpError)?;

        let status = response.status();
        let headers = response.headers().clone();
        let content = response.bytes().await.map_err(NotebookError::HttpError)?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "request failed");
        }

        ApiResponse::new(status, headers, content.to_vec()).error_for_status()
    }
}

#[async_trait]
impl Transport for NotebookClient {
    async fn call(&self, request: ApiRequest) -> Result<ApiResponse> {
        self.send(request).await
    }
}
