//! Listing source module
//!
//! A listing source yields opaque references to candidate businesses and,
//! per reference, the business name and raw website link. How listings are
//! discovered (scrolling a map feed, calling a places API, reading a file)
//! stays behind the `ListingSource` trait; the crawl engine never drives a
//! listing UI itself.

mod file;
mod memory;

pub use file::load_listing_file;
pub use memory::StaticListingSource;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Errors raised by a listing source
#[derive(Debug, Error)]
pub enum ListingError {
    #[error("Failed to read listings from {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Unknown listing reference: {0}")]
    UnknownListing(String),
}

/// Opaque handle identifying one candidate business
///
/// Only meaningful to the source that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListingRef(String);

impl ListingRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Per-listing details
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ListingDetails {
    #[serde(default)]
    pub name: Option<String>,

    /// Website link as shown by the listing, possibly a tracking redirect
    #[serde(default, alias = "website")]
    pub raw_website_url: Option<String>,
}

/// One pull from a listing source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingBatch {
    Listings(Vec<ListingRef>),

    /// No further listings are available; normal termination
    EndOfStream,
}

/// Source of candidate businesses
#[async_trait]
pub trait ListingSource: Send {
    /// Returns the next batch of listings, or `EndOfStream` once exhausted
    async fn next_batch(&mut self) -> Result<ListingBatch, ListingError>;

    /// Returns name and raw website link for a listing
    async fn details_for(&mut self, listing: &ListingRef) -> Result<ListingDetails, ListingError>;
}
