use crate::listing::{ListingBatch, ListingDetails, ListingError, ListingRef, ListingSource};
use async_trait::async_trait;

/// In-memory listing source handing out fixed-size batches
#[derive(Debug, Clone)]
pub struct StaticListingSource {
    listings: Vec<ListingDetails>,
    batch_size: usize,
    cursor: usize,
}

impl StaticListingSource {
    pub fn new(listings: Vec<ListingDetails>, batch_size: usize) -> Self {
        Self {
            listings,
            batch_size: batch_size.max(1),
            cursor: 0,
        }
    }

    /// Total number of listings this source will yield
    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }
}

#[async_trait]
impl ListingSource for StaticListingSource {
    async fn next_batch(&mut self) -> Result<ListingBatch, ListingError> {
        if self.cursor >= self.listings.len() {
            return Ok(ListingBatch::EndOfStream);
        }

        let end = (self.cursor + self.batch_size).min(self.listings.len());
        let refs = (self.cursor..end)
            .map(|idx| ListingRef::new(idx.to_string()))
            .collect();
        self.cursor = end;
        Ok(ListingBatch::Listings(refs))
    }

    async fn details_for(&mut self, listing: &ListingRef) -> Result<ListingDetails, ListingError> {
        listing
            .as_str()
            .parse::<usize>()
            .ok()
            .and_then(|idx| self.listings.get(idx))
            .cloned()
            .ok_or_else(|| ListingError::UnknownListing(listing.as_str().to_string()))
    }
}
