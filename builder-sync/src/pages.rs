//! Client for the storefront Pages API.
//!
//! Two endpoints are used:
//!
//! ```text
//! GET {base}/pages/{id}?shop={shop}   -> { success, page: { title, body_html, handle, updated_at } }
//! PUT {base}/pages/{id}  { shop, content } -> { success, error? }
//! ```
//!
//! Both are idempotent, so transport failures and non-2xx responses are
//! retried a bounded number of times with a fixed backoff. An explicit
//! `success: false` is an answer, not a failure, and is never retried.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use builder_core::{EditorError, ErrorKind};
use reqwest::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use url::Url;

/// Errors that can occur when talking to the Pages API.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The API base URL provided by configuration is invalid.
    #[error("invalid Pages API URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed (connection, timeout, etc.).
    #[error("Pages API request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The server answered with a non-success status.
    #[error("Pages API returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },
    /// The response body was not the expected JSON.
    #[error("failed to parse Pages API payload: {0}")]
    Json(#[from] serde_json::Error),
    /// The server reported `success: false`.
    #[error("Pages API rejected the request: {0}")]
    Rejected(String),
    /// The editor refused or failed the operation.
    #[error(transparent)]
    Editor(#[from] EditorError),
}

impl BridgeError {
    /// Returns true if this error is retryable (transport failures and non-2xx).
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Status { .. })
    }

    /// Error category for the UI.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Editor(err) => err.kind(),
            _ => ErrorKind::Network,
        }
    }
}

/// Retry policy for Pages API calls: fixed backoff, bounded attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay between attempts.
    pub backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(500),
        }
    }
}

impl RetryConfig {
    /// Create a retry configuration. `max_attempts` is at least 1.
    #[must_use]
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Single attempt, no retries.
    #[must_use]
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }
}

/// A stored page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Page title.
    #[serde(default)]
    pub title: String,
    /// Persisted body markup. Absent for pages never saved by the builder.
    #[serde(default)]
    pub body_html: Option<String>,
    /// URL handle.
    #[serde(default)]
    pub handle: String,
    /// Last update timestamp as reported by the store.
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Response of the fetch endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResponse {
    /// Whether the lookup succeeded.
    #[serde(default)]
    pub success: bool,
    /// The page, when found.
    #[serde(default)]
    pub page: Option<Page>,
    /// Error message on failure.
    #[serde(default)]
    pub error: Option<String>,
}

/// Response of the save endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveResponse {
    /// Whether the page was saved.
    #[serde(default)]
    pub success: bool,
    /// Error message on failure.
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
struct SaveRequest<'a> {
    shop: &'a str,
    content: &'a str,
}

/// The persistence seam. [`PagesClient`] talks HTTP; tests substitute
/// in-memory implementations.
#[async_trait]
pub trait PagesApi: Send + Sync {
    /// Fetch a page. `success: false` is returned as-is, not as an error.
    async fn fetch_page(&self, page_id: &str) -> Result<PageResponse, BridgeError>;

    /// Store `content` as the page body.
    async fn save_page(&self, page_id: &str, content: &str) -> Result<(), BridgeError>;
}

/// HTTP client for the Pages API.
#[derive(Clone)]
pub struct PagesClient {
    inner: Arc<InnerClient>,
}

struct InnerClient {
    http: Client,
    base: Url,
    shop: String,
    retry_config: RetryConfig,
}

impl PagesClient {
    /// Create a client with the default retry configuration.
    ///
    /// # Errors
    ///
    /// See [`PagesClient::with_retry_config`].
    pub fn new(base_url: impl AsRef<str>, shop: impl Into<String>) -> Result<Self, BridgeError> {
        Self::with_retry_config(base_url, shop, RetryConfig::default())
    }

    /// Create a client with a custom retry configuration.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidUrl`] if the URL is malformed.
    /// Returns [`BridgeError::Http`] if the HTTP client fails to build.
    pub fn with_retry_config(
        base_url: impl AsRef<str>,
        shop: impl Into<String>,
        retry_config: RetryConfig,
    ) -> Result<Self, BridgeError> {
        let base =
            Url::parse(base_url.as_ref()).map_err(|e| BridgeError::InvalidUrl(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(BridgeError::InvalidUrl(base.to_string()));
        }

        let http = Client::builder()
            .user_agent(concat!("page-builder/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(InnerClient {
                http,
                base,
                shop: shop.into(),
                retry_config,
            }),
        })
    }

    /// Shop this client acts for.
    #[must_use]
    pub fn shop(&self) -> &str {
        &self.inner.shop
    }

    fn page_url(&self, page_id: &str) -> Result<Url, BridgeError> {
        let mut url = self.inner.base.clone();
        url.path_segments_mut()
            .map_err(|()| BridgeError::InvalidUrl(self.inner.base.to_string()))?
            .pop_if_empty()
            .extend(["pages", page_id]);
        Ok(url)
    }

    async fn send_with_retry<T, F>(&self, operation: &str, build: F) -> Result<T, BridgeError>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        let config = &self.inner.retry_config;
        let mut attempt = 0;

        loop {
            attempt += 1;
            match Self::send_once(build()).await {
                Ok(body) => return Ok(serde_json::from_str(&body)?),
                Err(error) if error.is_retryable() && attempt < config.max_attempts => {
                    warn!(
                        "Pages API {} failed (attempt {}/{}), retrying in {}ms: {}",
                        operation,
                        attempt,
                        config.max_attempts,
                        config.backoff.as_millis(),
                        error
                    );
                    tokio::time::sleep(config.backoff).await;
                }
                Err(error) => return Err(error),
            }
        }
    }

    async fn send_once(request: RequestBuilder) -> Result<String, BridgeError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if status.is_success() {
            Ok(body)
        } else {
            Err(BridgeError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[async_trait]
impl PagesApi for PagesClient {
    async fn fetch_page(&self, page_id: &str) -> Result<PageResponse, BridgeError> {
        let url = self.page_url(page_id)?;
        let shop = self.inner.shop.as_str();
        self.send_with_retry("fetch", || {
            self.inner
                .http
                .get(url.clone())
                .query(&[("shop", shop)])
        })
        .await
    }

    async fn save_page(&self, page_id: &str, content: &str) -> Result<(), BridgeError> {
        let url = self.page_url(page_id)?;
        let request = SaveRequest {
            shop: &self.inner.shop,
            content,
        };
        let response: SaveResponse = self
            .send_with_retry("save", || self.inner.http.put(url.clone()).json(&request))
            .await?;
        if response.success {
            Ok(())
        } else {
            Err(BridgeError::Rejected(
                response.error.unwrap_or_else(|| "save failed".to_string()),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bridge_error_is_retryable() {
        assert!(BridgeError::Status {
            status: 503,
            body: String::new()
        }
        .is_retryable());
        assert!(!BridgeError::Rejected("nope".into()).is_retryable());
        assert!(!BridgeError::InvalidUrl("bad".into()).is_retryable());
        assert!(!BridgeError::Editor(EditorError::Busy("load".into())).is_retryable());
    }

    #[test]
    fn test_bridge_error_kind() {
        assert_eq!(
            BridgeError::Rejected("nope".into()).kind(),
            ErrorKind::Network
        );
        assert_eq!(
            BridgeError::Editor(EditorError::Busy("load".into())).kind(),
            ErrorKind::Busy
        );
    }

    #[test]
    fn test_retry_config_defaults() {
        let config = RetryConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.backoff, Duration::from_millis(500));
        assert_eq!(RetryConfig::new(0, Duration::ZERO).max_attempts, 1);
    }

    #[test]
    fn test_invalid_url_error() {
        match PagesClient::new("not-a-valid-url", "shop.example") {
            Err(BridgeError::InvalidUrl(_)) => {}
            Err(other) => panic!("Expected InvalidUrl error, got: {other:?}"),
            Ok(_) => panic!("Expected InvalidUrl error"),
        }
    }

    #[test]
    fn test_page_url_keeps_base_path() {
        let client = PagesClient::new("https://admin.example/api", "shop").expect("client");
        assert_eq!(
            client.page_url("42").expect("url").as_str(),
            "https://admin.example/api/pages/42"
        );
        let root = PagesClient::new("https://admin.example", "shop").expect("client");
        assert_eq!(
            root.page_url("7").expect("url").as_str(),
            "https://admin.example/pages/7"
        );
    }

    #[test]
    fn test_page_response_tolerates_missing_fields() {
        let response: PageResponse =
            serde_json::from_str(r#"{"success":true,"page":{"title":"About"}}"#).expect("parse");
        let page = response.page.expect("page");
        assert_eq!(page.title, "About");
        assert_eq!(page.body_html, None);

        let failed: PageResponse = serde_json::from_str(r#"{"success":false}"#).expect("parse");
        assert!(!failed.success);
        assert!(failed.page.is_none());
    }
}
