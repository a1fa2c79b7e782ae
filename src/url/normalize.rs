use crate::UrlError;
use url::Url;

/// Reduces a website URL to the form used as its dedup key
///
/// The canonical form is the input with surrounding whitespace trimmed and
/// everything from the first `?` onwards removed. Nothing else is touched:
/// scheme, host case and trailing slashes are kept as given, so keys written
/// by earlier runs keep matching.
///
/// # Examples
///
/// ```
/// use sumi_harvest::url::canonical_url;
///
/// assert_eq!(canonical_url("https://cafe.de/?utm_source=maps"), "https://cafe.de/");
/// assert_eq!(canonical_url("https://cafe.de/menu"), "https://cafe.de/menu");
/// ```
pub fn canonical_url(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.find('?') {
        Some(idx) => trimmed[..idx].to_string(),
        None => trimmed.to_string(),
    }
}

/// Parses a well-formed absolute http(s) URL
///
/// # Returns
///
/// * `Ok(Url)` - The parsed URL
/// * `Err(UrlError)` - The input is relative, malformed, not http(s), or has no host
pub fn parse_absolute(raw: &str) -> Result<Url, UrlError> {
    let url = Url::parse(raw.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    Ok(url)
}
