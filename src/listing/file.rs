use crate::listing::{ListingDetails, ListingError, StaticListingSource};
use std::path::Path;

/// Loads a JSON-lines listing file
///
/// Each non-blank line is an object like
/// `{"name": "Café Kreuzberg", "website": "https://cafe-kreuzberg.de/"}`;
/// both keys are optional. Malformed lines are logged and skipped.
///
/// # Arguments
///
/// * `path` - Path to the listing file
/// * `batch_size` - Number of listings per batch
pub fn load_listing_file(path: &Path, batch_size: usize) -> Result<StaticListingSource, ListingError> {
    let content = std::fs::read_to_string(path).map_err(|source| ListingError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let listings = parse_listing_lines(&content);
    tracing::info!("Loaded {} listings from {}", listings.len(), path.display());
    Ok(StaticListingSource::new(listings, batch_size))
}

fn parse_listing_lines(content: &str) -> Vec<ListingDetails> {
    let mut listings = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<ListingDetails>(line) {
            Ok(details) => listings.push(details),
            Err(e) => {
                tracing::warn!("Skipping malformed listing on line {}: {}", idx + 1, e);
            }
        }
    }

    listings
}
