//! Email extraction with noise filtering
//!
//! Addresses are pulled from the raw page source rather than the visible
//! text, since many sites only expose them inside `mailto:` hrefs, data
//! attributes or inline scripts. The raw matches are then filtered for the
//! usual false positives: retina asset names (`logo@2x.png`), placeholder
//! addresses from templates, and error-tracker DSN identifiers.

use crate::config::FilterConfig;
use regex::Regex;
use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("valid email regex")
});

/// Hex identifier in front of an error-tracking host, e.g. `0123abcd...@sentry.io`
static ERROR_TRACKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-f]{16,}@sentry").expect("valid tracker regex"));

/// Extracts and filters candidate email addresses
#[derive(Debug, Clone)]
pub struct EmailExtractor {
    blacklist_extensions: Vec<String>,
    blacklist_domains: HashSet<String>,
}

impl EmailExtractor {
    pub fn new<E, D>(blacklist_extensions: E, blacklist_domains: D) -> Self
    where
        E: IntoIterator,
        E::Item: AsRef<str>,
        D: IntoIterator,
        D::Item: AsRef<str>,
    {
        Self {
            blacklist_extensions: blacklist_extensions
                .into_iter()
                .map(|e| e.as_ref().to_lowercase())
                .collect(),
            blacklist_domains: blacklist_domains
                .into_iter()
                .map(|d| d.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn from_config(filters: &FilterConfig) -> Self {
        Self::new(&filters.blacklist_extensions, &filters.blacklist_domains)
    }

    /// Extracts the filtered set of addresses from raw page content
    ///
    /// An empty set is a normal result. Addresses keep the case they had in
    /// the page.
    pub fn extract(&self, content: &str) -> BTreeSet<String> {
        EMAIL_RE
            .find_iter(content)
            .map(|m| m.as_str())
            .filter(|candidate| !self.is_noise(candidate))
            .map(str::to_string)
            .collect()
    }

    /// Returns true if a regex match is not a real address
    pub fn is_noise(&self, candidate: &str) -> bool {
        let lower = candidate.to_lowercase();

        if self
            .blacklist_extensions
            .iter()
            .any(|ext| lower.ends_with(ext.as_str()))
        {
            return true;
        }

        let domain = lower.rsplit('@').next().unwrap_or("");
        if self.blacklist_domains.contains(domain) {
            return true;
        }

        ERROR_TRACKER_RE.is_match(&lower)
    }
}
