//! Relevant-page discovery
//!
//! Picks the links on a homepage that likely lead to contact, about,
//! careers or team pages, by plain substring matching of a fixed bilingual
//! keyword list against each anchor's href and visible text.

use crate::config::FilterConfig;
use crate::crawler::parser::{extract_anchors, resolve_link};
use std::collections::BTreeMap;
use url::Url;

/// A subpage worth scanning for emails
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelevantPage {
    /// Absolute URL of the page
    pub url: String,

    /// First keyword that matched its anchor
    pub matched_keyword: String,
}

/// Selects relevant subpages from a fetched page
#[derive(Debug, Clone)]
pub struct RelevanceClassifier {
    keywords: Vec<String>,
}

impl RelevanceClassifier {
    /// Creates a classifier; keywords are lower-cased once here
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn from_config(filters: &FilterConfig) -> Self {
        Self::new(&filters.keywords)
    }

    /// Returns the first keyword contained in `href` or `text`
    ///
    /// Both sides are compared lower-cased.
    pub fn matching_keyword(&self, href: &str, text: &str) -> Option<&str> {
        let href = href.to_lowercase();
        let text = text.to_lowercase();
        self.keywords
            .iter()
            .find(|kw| href.contains(kw.as_str()) || text.contains(kw.as_str()))
            .map(String::as_str)
    }

    /// Finds relevant pages linked from `html`
    ///
    /// Matches are resolved against `base_url`, collapsed by URL and returned
    /// sorted by URL so the scan order is deterministic. Unparseable content
    /// yields no pages.
    pub fn find_relevant_pages(&self, html: &str, base_url: &Url) -> Vec<RelevantPage> {
        let anchors = match extract_anchors(html) {
            Ok(anchors) => anchors,
            Err(e) => {
                tracing::warn!("Failed to parse anchors on {}: {}", base_url, e);
                return Vec::new();
            }
        };

        let mut pages: BTreeMap<String, String> = BTreeMap::new();
        for anchor in &anchors {
            let Some(keyword) = self.matching_keyword(&anchor.href, &anchor.text) else {
                continue;
            };
            let Some(url) = resolve_link(&anchor.href, base_url) else {
                continue;
            };
            pages
                .entry(url.to_string())
                .or_insert_with(|| keyword.to_string());
        }

        tracing::trace!(
            "{} of {} anchors on {} are relevant",
            pages.len(),
            anchors.len(),
            base_url
        );

        pages
            .into_iter()
            .map(|(url, matched_keyword)| RelevantPage {
                url,
                matched_keyword,
            })
            .collect()
    }
}
