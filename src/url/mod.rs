//! URL handling module for Sumi-Harvest
//!
//! This module provides the canonical dedup form of website URLs and the
//! classification of tracking/ad-click redirect links.

mod normalize;

// Re-export main functions
pub use normalize::{canonical_url, parse_absolute};

/// Returns true if the URL is an indirect link that must be navigated
/// before its destination is known
///
/// A URL is indirect when it contains any of the configured redirect
/// patterns (by default the ad-click and generic redirect paths of the
/// search engine the listings come from).
///
/// # Examples
///
/// ```
/// use sumi_harvest::url::is_tracking_redirect;
///
/// let patterns = vec!["google.com/aclk".to_string(), "google.com/url".to_string()];
/// assert!(is_tracking_redirect("https://www.google.com/aclk?sa=l&ai=x", &patterns));
/// assert!(!is_tracking_redirect("https://baeckerei-schmidt.de/", &patterns));
/// ```
pub fn is_tracking_redirect(url: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|pattern| url.contains(pattern.as_str()))
}
