//! Redirect resolution for tracking links
//!
//! Listing providers often wrap a business website in an ad-click or
//! generic redirect URL. Those links are navigated in a throwaway session
//! until they settle on the real destination; anything else is already
//! final and only has its query string stripped.

use crate::crawler::fetcher::FetchError;
use crate::url::{canonical_url, is_tracking_redirect, parse_absolute};
use async_trait::async_trait;
use reqwest::{header::USER_AGENT, redirect::Policy, Client};
use scraper::{Html, Selector};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Result of resolving a raw website link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Destination URL, query string stripped
    Final(String),

    /// The destination could not be determined; skip the site
    Unresolved,
}

/// Navigation collaborator
///
/// Implementations must not share session state (cookies, connections)
/// between calls.
#[async_trait]
pub trait Navigator: Send + Sync {
    /// Navigates to `url` and returns the URL the navigation settled on
    async fn navigate(&self, url: &Url, identity: &str) -> Result<String, FetchError>;
}

/// Navigator that follows HTTP redirects in a fresh client per call
#[derive(Debug, Clone)]
pub struct HttpNavigator {
    patterns: Vec<String>,
    accept_invalid_certs: bool,
}

impl HttpNavigator {
    /// # Arguments
    ///
    /// * `patterns` - Redirect patterns; a settled URL still matching one is
    ///   inspected for an embedded destination
    /// * `accept_invalid_certs` - Tolerate broken TLS setups
    pub fn new(patterns: Vec<String>, accept_invalid_certs: bool) -> Self {
        Self {
            patterns,
            accept_invalid_certs,
        }
    }
}

#[async_trait]
impl Navigator for HttpNavigator {
    async fn navigate(&self, url: &Url, identity: &str) -> Result<String, FetchError> {
        // Session lives for this call only and is dropped on every exit path
        let session = Client::builder()
            .cookie_store(true)
            .redirect(Policy::limited(10))
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .build()
            .map_err(|e| FetchError::Request {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let response = session
            .get(url.clone())
            .header(USER_AGENT, identity)
            .send()
            .await
            .map_err(|e| FetchError::Connect {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let settled = response.url().clone();
        if !is_tracking_redirect(settled.as_str(), &self.patterns) {
            return Ok(settled.to_string());
        }

        // Interstitial pages carry the destination in the query or a meta refresh
        if let Some(target) = target_from_query(&settled) {
            return Ok(target);
        }

        let body = response.text().await.unwrap_or_default();
        Ok(meta_refresh_target(&body, &settled).unwrap_or_else(|| settled.to_string()))
    }
}

/// Reads an absolute http(s) destination from well-known query parameters
pub fn target_from_query(url: &Url) -> Option<String> {
    const KEYS: &[&str] = &["adurl", "url", "q"];

    for key in KEYS {
        let found = url
            .query_pairs()
            .find(|(k, _)| k == *key)
            .and_then(|(_, v)| parse_absolute(&v).ok());
        if let Some(target) = found {
            return Some(target.to_string());
        }
    }
    None
}

/// Reads the target of a `<meta http-equiv="refresh" content="0;url=...">`
pub fn meta_refresh_target(html: &str, base: &Url) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("meta[http-equiv][content]").ok()?;

    document
        .select(&selector)
        .filter(|el| {
            el.value()
                .attr("http-equiv")
                .is_some_and(|v| v.eq_ignore_ascii_case("refresh"))
        })
        .filter_map(|el| el.value().attr("content"))
        .find_map(|content| {
            let idx = content.to_ascii_lowercase().find("url=")?;
            let target = content[idx + 4..].trim().trim_matches(|c: char| c == '\'' || c == '"');
            base.join(target).ok().map(|u| u.to_string())
        })
}

/// Turns raw website links into final, canonical URLs
#[derive(Clone)]
pub struct RedirectResolver {
    patterns: Vec<String>,
    navigator: Arc<dyn Navigator>,
    timeout: Duration,
}

impl RedirectResolver {
    pub fn new(patterns: Vec<String>, navigator: Arc<dyn Navigator>, timeout: Duration) -> Self {
        Self {
            patterns,
            navigator,
            timeout,
        }
    }

    /// Returns true if `url` needs navigation before it is known
    pub fn is_indirect(&self, url: &str) -> bool {
        is_tracking_redirect(url, &self.patterns)
    }

    /// Resolves a raw website link
    ///
    /// Direct links are returned canonicalized without any navigation.
    /// Indirect links are navigated with a bounded wait; a failed, timed-out,
    /// or still-indirect navigation is `Unresolved`.
    pub async fn resolve(&self, raw_url: &str, identity: &str) -> Resolution {
        let url = match parse_absolute(raw_url) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Cannot resolve malformed website link '{}': {}", raw_url, e);
                return Resolution::Unresolved;
            }
        };

        if !self.is_indirect(url.as_str()) {
            return Resolution::Final(canonical_url(raw_url));
        }

        tracing::debug!("Resolving redirect link {}", raw_url);
        let settled =
            match tokio::time::timeout(self.timeout, self.navigator.navigate(&url, identity)).await
            {
                Ok(Ok(settled)) => settled,
                Ok(Err(e)) => {
                    tracing::warn!("Redirect navigation failed for {}: {}", raw_url, e);
                    return Resolution::Unresolved;
                }
                Err(_) => {
                    tracing::warn!(
                        "Redirect navigation for {} did not settle within {:?}",
                        raw_url,
                        self.timeout
                    );
                    return Resolution::Unresolved;
                }
            };

        if settled == url.as_str() || self.is_indirect(&settled) {
            tracing::warn!("Redirect link {} never left the redirect service", raw_url);
            return Resolution::Unresolved;
        }

        let final_url = canonical_url(&settled);
        tracing::debug!("Resolved {} -> {}", raw_url, final_url);
        Resolution::Final(final_url)
    }
}
