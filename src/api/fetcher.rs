//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests against a BookStack instance:
//! - Building HTTP clients with the token authorization header
//! - Per-request timeouts
//! - Mapping transport and status failures to [`FetchError`]

use crate::config::InstanceConfig;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// Errors produced while fetching a URL
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request { url: String, source: reqwest::Error },

    #[error("request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("request to {url} failed: {message}")]
    Other { url: String, message: String },
}

/// Retrieves raw response bodies for URLs
///
/// Implementations carry their own credentials; callers only see bytes.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Fetcher backed by reqwest, authenticating with a BookStack API token
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Builds a fetcher for the given instance
    ///
    /// Every request carries `Authorization: Token <id>:<secret>` and is
    /// bounded by the instance's `request-timeout`.
    ///
    /// # Returns
    ///
    /// * `Ok(HttpFetcher)` - Successfully built HTTP client
    /// * `Err(FetchError)` - The token contains characters not allowed in a header
    pub fn new(instance: &InstanceConfig) -> Result<Self, FetchError> {
        let auth = format!("Token {}:{}", instance.token_id, instance.token_secret);
        let mut auth_value = HeaderValue::from_str(&auth).map_err(|e| FetchError::Other {
            url: instance.base_url.clone(),
            message: format!("invalid token header: {}", e),
        })?;
        auth_value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth_value);

        let client = Client::builder()
            .user_agent(concat!("bookstack-backup/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(Duration::from_secs(instance.request_timeout))
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| FetchError::Request {
                url: instance.base_url.clone(),
                source: e,
            })?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| classify(url, e))?;
        Ok(body.to_vec())
    }
}

/// Maps a reqwest error to the matching [`FetchError`] variant
fn classify(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Request {
            url: url.to_string(),
            source: error,
        }
    }
}
