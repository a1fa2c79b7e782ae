//! HTML parser for enumerating anchors
//!
//! This module handles parsing HTML content to extract every `<a href>`
//! together with its visible text, and resolving hrefs against a base URL.

use scraper::{Html, Selector};
use url::Url;

/// One anchor element as found in a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    /// Raw `href` attribute value
    pub href: String,

    /// Visible link text, whitespace-collapsed
    pub text: String,
}

/// Extracts all anchors that carry an `href`
///
/// # Returns
///
/// * `Ok(Vec<Anchor>)` - Anchors in document order
/// * `Err(String)` - The anchor selector could not be built
///
/// # Example
///
/// ```
/// use sumi_harvest::crawler::extract_anchors;
///
/// let html = r#"<a href="/kontakt"> Kontakt  &amp; Anfahrt </a>"#;
/// let anchors = extract_anchors(html).unwrap();
/// assert_eq!(anchors[0].href, "/kontakt");
/// assert_eq!(anchors[0].text, "Kontakt & Anfahrt");
/// ```
pub fn extract_anchors(html: &str) -> Result<Vec<Anchor>, String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a[href]").map_err(|e| format!("bad selector: {:?}", e))?;

    Ok(document
        .select(&selector)
        .filter_map(|element| {
            let href = element.value().attr("href")?;
            let text = element
                .text()
                .flat_map(str::split_whitespace)
                .collect::<Vec<_>>()
                .join(" ");
            Some(Anchor {
                href: href.to_string(),
                text,
            })
        })
        .collect())
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link does not point at a page:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    // Same page anchors
    if href.starts_with('#') {
        return None;
    }

    match base_url.join(href) {
        Ok(mut absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                // `/#team` is the page itself
                absolute_url.set_fragment(None);
                Some(absolute_url)
            } else {
                None
            }
        }
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://example.de/page").unwrap()
    }

    #[test]
    fn test_extract_anchor_text_and_href() {
        let html = r#"<html><body><a href="/careers">Join <b>our</b> team</a></body></html>"#;
        let anchors = extract_anchors(html).unwrap();
        assert_eq!(
            anchors,
            vec![Anchor {
                href: "/careers".to_string(),
                text: "Join our team".to_string()
            }]
        );
    }

    #[test]
    fn test_anchor_without_href_is_ignored() {
        let html = r#"<a name="top">Top</a><a href="/x">X</a>"#;
        assert_eq!(extract_anchors(html).unwrap().len(), 1);
    }

    #[test]
    fn test_empty_document() {
        assert!(extract_anchors("").unwrap().is_empty());
    }

    #[test]
    fn test_resolve_absolute_link() {
        let url = resolve_link("https://other.de/page", &base_url()).unwrap();
        assert_eq!(url.as_str(), "https://other.de/page");
    }

    #[test]
    fn test_resolve_relative_link() {
        let url = resolve_link("/other", &base_url()).unwrap();
        assert_eq!(url.as_str(), "https://example.de/other");
    }

    #[test]
    fn test_resolve_relative_path_link() {
        let url = resolve_link("other", &base_url()).unwrap();
        assert_eq!(url.as_str(), "https://example.de/other");
    }

    #[test]
    fn test_skip_special_schemes() {
        assert!(resolve_link("javascript:void(0)", &base_url()).is_none());
        assert!(resolve_link("mailto:kontakt@example.de", &base_url()).is_none());
        assert!(resolve_link("MAILTO:kontakt@example.de", &base_url()).is_none());
        assert!(resolve_link("tel:+49301234567", &base_url()).is_none());
        assert!(resolve_link("data:text/html,<h1>x</h1>", &base_url()).is_none());
    }

    #[test]
    fn test_resolve_drops_fragment() {
        let url = resolve_link("/#kontakt", &base_url()).unwrap();
        assert_eq!(url.as_str(), "https://example.de/");

        let url = resolve_link("about#team", &base_url()).unwrap();
        assert_eq!(url.as_str(), "https://example.de/about");
    }

    #[test]
    fn test_skip_fragment_only() {
        assert!(resolve_link("#kontakt", &base_url()).is_none());
    }

    #[test]
    fn test_skip_empty() {
        assert!(resolve_link("   ", &base_url()).is_none());
    }
}
