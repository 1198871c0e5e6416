//! REST client for the Stone Art backend.
//!
//! # Architecture
//!
//! - One [`ApiClient`] per process, cheaply cloneable via `Arc`
//! - Thin wrappers: every method maps to exactly one backend endpoint
//! - Authenticated calls carry `Authorization: Bearer <token>`
//! - The category list is cached in memory via `moka` (5 minute TTL)
//! - No retries, no timeouts: callers decide what a failure means
//!
//! Endpoint groups live in submodules:
//!
//! - [`catalog`] - products, search, categories
//! - [`cart`] - the per-user remote cart
//! - [`auth`] - token verification and admin credential exchange
//! - [`orders`] - checkout, order history, profile
//!
//! # Example
//!
//! ```rust,ignore
//! use stoneart_storefront::api::ApiClient;
//!
//! let client = ApiClient::new(config.api_url.clone());
//! let featured = client.featured_products(4).await?;
//! ```

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod orders;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::{Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;
use url::Url;

pub use types::*;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// Response status code.
        status: u16,
        /// First part of the response body, for diagnostics.
        body: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Resource not found in an otherwise successful response.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Call requires a bearer token and none is stored.
    #[error("Not authenticated")]
    Unauthenticated,
}

impl ApiError {
    /// Status code of a non-success response, if that is what this is.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Cache key for reference data that changes rarely.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
enum CacheKey {
    Categories,
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the Stone Art REST backend.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<CacheKey, Arc<Vec<Category>>>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new client for the backend at `base_url`.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a client around an existing `reqwest::Client`.
    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: Url) -> Self {
        let cache = Cache::builder()
            .max_capacity(16)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url,
                cache,
            }),
        }
    }

    /// Backend base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Absolute URL for an endpoint path such as `/products/search`.
    ///
    /// # Errors
    ///
    /// Returns an error if the joined URL does not parse.
    pub fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        let base = self.inner.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{}", path.trim_start_matches('/')))?)
    }

    /// Absolute URL with query parameters appended.
    ///
    /// # Errors
    ///
    /// Returns an error if the joined URL does not parse.
    pub fn endpoint_with_query(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Url, ApiError> {
        let mut url = self.endpoint(path)?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Start a request, attaching the bearer token when present.
    #[must_use]
    pub fn request(&self, method: Method, url: Url, token: Option<&SecretString>) -> RequestBuilder {
        let builder = self.inner.client.request(method, url);
        match token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    /// Send a request and fail on non-success statuses.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` on transport failure and `ApiError::Status`
    /// on a non-success response.
    pub async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(200).collect();
            tracing::warn!(status = %status, body = %body, "Backend returned non-success status");
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        debug!(status = %status, "Backend request succeeded");
        Ok(response)
    }

    /// `GET` a JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-success status or a body
    /// that does not deserialize into `T`.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        token: Option<&SecretString>,
    ) -> Result<T, ApiError> {
        let response = self.send(self.request(Method::GET, url, token)).await?;
        read_json(response).await
    }

    /// Send a JSON body and deserialize the JSON answer.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-success status or a body
    /// that does not deserialize into `T`.
    pub async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: &B,
        token: Option<&SecretString>,
    ) -> Result<T, ApiError> {
        let response = self
            .send(self.request(method, url, token).json(body))
            .await?;
        read_json(response).await
    }

    /// Send a JSON body and ignore whatever the backend answers with.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or non-success status.
    pub async fn send_json_unit<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: &B,
        token: Option<&SecretString>,
    ) -> Result<(), ApiError> {
        self.send(self.request(method, url, token).json(body))
            .await
            .map(drop)
    }

    /// Send a multipart form and ignore the answer body.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or non-success status.
    pub async fn send_multipart(
        &self,
        method: Method,
        url: Url,
        form: reqwest::multipart::Form,
        token: Option<&SecretString>,
    ) -> Result<(), ApiError> {
        self.send(self.request(method, url, token).multipart(form))
            .await
            .map(drop)
    }
}

/// Read a response body as JSON, logging the head of bodies that fail to parse.
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %text.chars().take(500).collect::<String>(),
            "Failed to parse backend response"
        );
        ApiError::Parse(e)
    })
}
