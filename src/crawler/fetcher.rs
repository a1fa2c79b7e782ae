//! HTTP fetcher implementation
//!
//! This module handles all page requests for the crawler, including:
//! - Building HTTP clients
//! - GET requests carrying a per-request identity
//! - Bounding every fetch with a timeout
//! - Error classification

use async_trait::async_trait;
use reqwest::{header::USER_AGENT, redirect::Policy, Client};
use std::time::Duration;
use thiserror::Error;

/// Why a page could not be fetched
///
/// Every variant is recoverable: the site crawler treats a failed page as
/// one that contains no emails.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}: {message}")]
    Connect { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Unsupported content type '{content_type}' for {url}")]
    ContentMismatch { url: String, content_type: String },

    #[error("Request failed for {url}: {message}")]
    Request { url: String, message: String },
}

/// Page fetch collaborator
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches the raw content of `url`, sending `identity` as the user agent
    async fn fetch(&self, url: &str, identity: &str) -> Result<String, FetchError>;
}

/// Builds an HTTP client for page fetches
///
/// The user agent is left unset; each request carries its own identity.
///
/// # Arguments
///
/// * `timeout` - Whole-request timeout
/// * `accept_invalid_certs` - Tolerate broken TLS setups
pub fn build_http_client(timeout: Duration, accept_invalid_certs: bool) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(10))
        .danger_accept_invalid_certs(accept_invalid_certs)
        .gzip(true)
        .brotli(true)
        .build()
}

/// `PageFetcher` backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, identity: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, identity)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !is_scannable_content_type(&content_type) {
            return Err(FetchError::ContentMismatch {
                url: url.to_string(),
                content_type,
            });
        }

        response.text().await.map_err(|e| classify_error(url, e))
    }
}

/// Maps a reqwest error onto the fetch error taxonomy
fn classify_error(url: &str, e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if e.is_connect() {
        FetchError::Connect {
            url: url.to_string(),
            message: e.to_string(),
        }
    } else {
        FetchError::Request {
            url: url.to_string(),
            message: e.to_string(),
        }
    }
}

/// Returns true if a response with this Content-Type may hold addresses
///
/// A missing header is given the benefit of the doubt.
pub fn is_scannable_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    mime.is_empty()
        || mime.starts_with("text/")
        || mime.contains("html")
        || mime.contains("xml")
        || mime.contains("json")
        || mime.contains("javascript")
}

/// Runs a fetch with a hard upper bound on its duration
///
/// A fetcher that never returns resolves to `FetchError::Timeout` once
/// `timeout` elapses.
pub async fn fetch_with_timeout(
    fetcher: &dyn PageFetcher,
    url: &str,
    identity: &str,
    timeout: Duration,
) -> Result<String, FetchError> {
    match tokio::time::timeout(timeout, fetcher.fetch(url, identity)).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout {
            url: url.to_string(),
        }),
    }
}
